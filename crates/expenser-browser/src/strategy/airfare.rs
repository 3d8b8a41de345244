use expenser_config::Config;
use expenser_core::{ExpenseRecord, TypeDetails};

use super::{base_plan, FieldAction, FieldStrategy};

/// Airfare items carry the itinerary block: ticket number, flight type
/// and class, route, passenger, and booking agency.
pub struct AirfareStrategy;

impl FieldStrategy for AirfareStrategy {
    fn name(&self) -> &'static str {
        "airfare"
    }

    fn plan(&self, record: &ExpenseRecord, config: &Config) -> Vec<FieldAction> {
        let selectors = &config.selectors;
        let mut plan = base_plan(record, selectors);
        if let TypeDetails::Airfare {
            ticket_number,
            flight_class,
            international,
            departure_city,
            arrival_city,
            passenger_name,
            agency,
        } = &record.details
        {
            plan.push(FieldAction::Fill {
                field: selectors.ticket_number.clone(),
                value: ticket_number.clone(),
            });
            plan.push(FieldAction::Select {
                field: selectors.flight_type_dropdown.clone(),
                label: if *international {
                    "International".to_string()
                } else {
                    "Domestic".to_string()
                },
            });
            plan.push(FieldAction::Select {
                field: selectors.flight_class_dropdown.clone(),
                label: flight_class.clone(),
            });
            plan.push(FieldAction::Fill {
                field: selectors.departure_city.clone(),
                value: departure_city.clone(),
            });
            plan.push(FieldAction::Fill {
                field: selectors.arrival_city.clone(),
                value: arrival_city.clone(),
            });
            plan.push(FieldAction::Fill {
                field: selectors.passenger_name.clone(),
                value: passenger_name.clone(),
            });
            plan.push(FieldAction::Fill {
                field: selectors.agency_field.clone(),
                value: agency.clone(),
            });
        }
        plan
    }
}
