//! Configuration schema definitions.

use serde::{Deserialize, Serialize};

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub llm: LlmConfig,

    #[serde(default)]
    pub ocr: OcrConfig,

    #[serde(default)]
    pub user: UserConfig,

    #[serde(default)]
    pub report: ReportConfig,

    #[serde(default)]
    pub extraction: ExtractionConfig,

    #[serde(default)]
    pub dedupe: DedupeConfig,

    #[serde(default)]
    pub browser: BrowserConfig,

    #[serde(default)]
    pub meals: MealLabels,

    /// Expense-type allow-list. Labels must match the target
    /// application's dropdown entries exactly (case-sensitive).
    #[serde(default)]
    pub expense_types: Vec<ExpenseType>,

    #[serde(default)]
    pub selectors: Selectors,
}

/// How receipts are read before reaching the language model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionMode {
    /// Send the image itself to a vision-capable model.
    Vision,
    /// Run local OCR and send text only.
    OcrText,
}

/// LLM provider configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default = "default_mode")]
    pub mode: ExtractionMode,

    #[serde(default)]
    pub api_key: String,

    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            mode: default_mode(),
            api_key: String::new(),
            base_url: default_base_url(),
            model: default_model(),
            max_tokens: default_max_tokens(),
        }
    }
}

fn default_mode() -> ExtractionMode {
    ExtractionMode::Vision
}

fn default_base_url() -> String {
    "https://api.openai.com/v1/chat/completions".to_string()
}

fn default_model() -> String {
    "gpt-4o".to_string()
}

fn default_max_tokens() -> u32 {
    800
}

/// OCR engine configuration (used in `ocr_text` mode).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OcrConfig {
    /// Executable invoked as `<command> <image> stdout`.
    #[serde(default = "default_ocr_command")]
    pub command: String,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            command: default_ocr_command(),
        }
    }
}

fn default_ocr_command() -> String {
    "tesseract".to_string()
}

/// Operator identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserConfig {
    #[serde(default)]
    pub full_name: String,

    #[serde(default)]
    pub home_city: String,

    #[serde(default = "default_currency")]
    pub home_currency: String,
}

impl Default for UserConfig {
    fn default() -> Self {
        Self {
            full_name: String::new(),
            home_city: String::new(),
            home_currency: default_currency(),
        }
    }
}

fn default_currency() -> String {
    "USD".to_string()
}

/// Report-level settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Destination label used when no receipt city differs from home.
    #[serde(default = "default_destination")]
    pub default_destination: String,

    /// Travel agency entered on airfare items when the receipt names none.
    #[serde(default)]
    pub travel_agency: String,

    /// Status text marking a reusable in-progress report.
    #[serde(default = "default_in_progress_status")]
    pub in_progress_status: String,

    /// Fallback expense-type label for unresolvable receipts.
    #[serde(default = "default_expense_type")]
    pub default_expense_type: String,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            default_destination: default_destination(),
            travel_agency: String::new(),
            in_progress_status: default_in_progress_status(),
            default_expense_type: default_expense_type(),
        }
    }
}

fn default_destination() -> String {
    "Offsite".to_string()
}

fn default_in_progress_status() -> String {
    "Not Submitted".to_string()
}

fn default_expense_type() -> String {
    "Miscellaneous Other".to_string()
}

/// Extraction batch settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionConfig {
    /// Concurrent in-flight extraction calls. Results are reassembled
    /// in input order regardless of this bound.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Extra attempts after a transient network failure.
    #[serde(default = "default_retries")]
    pub retries: u32,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            retries: default_retries(),
        }
    }
}

fn default_concurrency() -> usize {
    4
}

fn default_retries() -> u32 {
    2
}

/// Duplicate-detection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DedupeConfig {
    /// Allowed amount difference, in minor currency units. Zero means
    /// exact match.
    #[serde(default)]
    pub amount_tolerance_cents: i64,
}

impl Default for DedupeConfig {
    fn default() -> Self {
        Self {
            amount_tolerance_cents: 0,
        }
    }
}

/// Browser session configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowserConfig {
    /// Chrome remote-debugging endpoint.
    #[serde(default = "default_cdp_endpoint")]
    pub cdp_endpoint: String,

    /// Expense application URL.
    #[serde(default)]
    pub app_url: String,

    /// Selectors whose visibility means the operator is signed in.
    #[serde(default)]
    pub login_indicators: Vec<String>,

    /// Optional SSO button clicked once before the login wait.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sso_button: Option<String>,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            cdp_endpoint: default_cdp_endpoint(),
            app_url: String::new(),
            login_indicators: Vec::new(),
            sso_button: None,
        }
    }
}

fn default_cdp_endpoint() -> String {
    "http://localhost:9222".to_string()
}

/// Labels substituted for the model's meal label by time-of-day
/// bucketing. Each must also appear in the allow-list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MealLabels {
    #[serde(default = "default_breakfast")]
    pub breakfast: String,

    #[serde(default = "default_lunch")]
    pub lunch: String,

    #[serde(default = "default_dinner")]
    pub dinner: String,
}

impl Default for MealLabels {
    fn default() -> Self {
        Self {
            breakfast: default_breakfast(),
            lunch: default_lunch(),
            dinner: default_dinner(),
        }
    }
}

fn default_breakfast() -> String {
    "Meals - Breakfast".to_string()
}

fn default_lunch() -> String {
    "Meals - Lunch".to_string()
}

fn default_dinner() -> String {
    "Meals - Dinner".to_string()
}

/// Field-strategy category for an expense type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpenseCategory {
    #[default]
    Generic,
    Meal,
    Airfare,
    Hotel,
}

/// One entry of the expense-type allow-list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpenseType {
    /// Exact dropdown label in the target application.
    pub label: String,

    #[serde(default)]
    pub category: ExpenseCategory,

    /// Hints passed to the model prompt.
    #[serde(default)]
    pub keywords: Vec<String>,
}

/// CSS selectors and accessible labels for every control the browser
/// layer touches. Defaults match the target application's current
/// markup; all of them can be overridden from the config file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Selectors {
    // Report shell
    #[serde(default = "d_report_status")]
    pub report_status: String,
    #[serde(default = "d_create_report")]
    pub create_report: String,
    #[serde(default = "d_purpose_field")]
    pub purpose_field: String,
    #[serde(default = "d_existing_item_cards")]
    pub existing_item_cards: String,
    #[serde(default = "d_existing_item_date")]
    pub existing_item_date: String,
    #[serde(default = "d_existing_item_amount")]
    pub existing_item_amount: String,
    #[serde(default = "d_existing_item_merchant")]
    pub existing_item_merchant: String,
    #[serde(default = "d_error_dialog")]
    pub error_dialog: String,
    #[serde(default = "d_error_dialog_body")]
    pub error_dialog_body: String,

    // Item toolbar labels (reached by tab order, not CSS)
    #[serde(default = "d_create_item_label")]
    pub create_item_label: String,
    #[serde(default = "d_create_another_label")]
    pub create_another_label: String,
    #[serde(default = "d_save_and_close_label")]
    pub save_and_close_label: String,
    #[serde(default = "d_item_form_anchor")]
    pub item_form_anchor: String,

    // Item fields
    #[serde(default = "d_date_field")]
    pub date_field: String,
    #[serde(default = "d_amount_field")]
    pub amount_field: String,
    #[serde(default = "d_merchant_field")]
    pub merchant_field: String,
    #[serde(default = "d_description_field")]
    pub description_field: String,
    #[serde(default = "d_expense_type_dropdown")]
    pub expense_type_dropdown: String,

    // Meal fields
    #[serde(default = "d_attendee_count")]
    pub attendee_count: String,
    #[serde(default = "d_attendee_names")]
    pub attendee_names: String,

    // Airfare fields
    #[serde(default = "d_ticket_number")]
    pub ticket_number: String,
    #[serde(default = "d_flight_type_dropdown")]
    pub flight_type_dropdown: String,
    #[serde(default = "d_flight_class_dropdown")]
    pub flight_class_dropdown: String,
    #[serde(default = "d_departure_city")]
    pub departure_city: String,
    #[serde(default = "d_arrival_city")]
    pub arrival_city: String,
    #[serde(default = "d_passenger_name")]
    pub passenger_name: String,
    #[serde(default = "d_agency_field")]
    pub agency_field: String,

    // Hotel nightly rows ({row} is replaced with the row index)
    #[serde(default = "d_hotel_add_row")]
    pub hotel_add_row: String,
    #[serde(default = "d_hotel_row_date")]
    pub hotel_row_date: String,
    #[serde(default = "d_hotel_row_amount")]
    pub hotel_row_amount: String,

    // Attachment upload
    #[serde(default = "d_attachment_dropzone")]
    pub attachment_dropzone: String,
    #[serde(default = "d_attachment_input")]
    pub attachment_input: String,
    #[serde(default = "d_attachment_list")]
    pub attachment_list: String,
}

impl Default for Selectors {
    fn default() -> Self {
        Self {
            report_status: d_report_status(),
            create_report: d_create_report(),
            purpose_field: d_purpose_field(),
            existing_item_cards: d_existing_item_cards(),
            existing_item_date: d_existing_item_date(),
            existing_item_amount: d_existing_item_amount(),
            existing_item_merchant: d_existing_item_merchant(),
            error_dialog: d_error_dialog(),
            error_dialog_body: d_error_dialog_body(),
            create_item_label: d_create_item_label(),
            create_another_label: d_create_another_label(),
            save_and_close_label: d_save_and_close_label(),
            item_form_anchor: d_item_form_anchor(),
            date_field: d_date_field(),
            amount_field: d_amount_field(),
            merchant_field: d_merchant_field(),
            description_field: d_description_field(),
            expense_type_dropdown: d_expense_type_dropdown(),
            attendee_count: d_attendee_count(),
            attendee_names: d_attendee_names(),
            ticket_number: d_ticket_number(),
            flight_type_dropdown: d_flight_type_dropdown(),
            flight_class_dropdown: d_flight_class_dropdown(),
            departure_city: d_departure_city(),
            arrival_city: d_arrival_city(),
            passenger_name: d_passenger_name(),
            agency_field: d_agency_field(),
            hotel_add_row: d_hotel_add_row(),
            hotel_row_date: d_hotel_row_date(),
            hotel_row_amount: d_hotel_row_amount(),
            attachment_dropzone: d_attachment_dropzone(),
            attachment_input: d_attachment_input(),
            attachment_list: d_attachment_list(),
        }
    }
}

fn d_report_status() -> String {
    "span.x2ic".into()
}
fn d_create_report() -> String {
    "[aria-label='Create Report']".into()
}
fn d_purpose_field() -> String {
    "input[id*='purpose' i]".into()
}
fn d_existing_item_cards() -> String {
    "div.xjb[data-afrrk]".into()
}
fn d_existing_item_date() -> String {
    "span.xnk".into()
}
fn d_existing_item_amount() -> String {
    "span.xmu".into()
}
fn d_existing_item_merchant() -> String {
    "span[id*='otn'] span.x25".into()
}
fn d_error_dialog() -> String {
    "div[id$='msgDlg']".into()
}
fn d_error_dialog_body() -> String {
    "div[id$='msgDlg::_cnt']".into()
}
fn d_create_item_label() -> String {
    "Create Item".into()
}
fn d_create_another_label() -> String {
    "Create Another".into()
}
fn d_save_and_close_label() -> String {
    "Save and Close".into()
}
fn d_item_form_anchor() -> String {
    "Create Expense Item".into()
}
fn d_date_field() -> String {
    "input[id*='StartDate']".into()
}
fn d_amount_field() -> String {
    "input[id*='ReceiptAmount']".into()
}
fn d_merchant_field() -> String {
    "input[id*='Merchant']".into()
}
fn d_description_field() -> String {
    "input[id*='Description'], textarea[id*='Description']".into()
}
fn d_expense_type_dropdown() -> String {
    "select[id*='ExpenseTypeId']".into()
}
fn d_attendee_count() -> String {
    "input[id*='numberOfAttendees']".into()
}
fn d_attendee_names() -> String {
    "input[id*='attendeesMeals']".into()
}
fn d_ticket_number() -> String {
    "input[id*='TicketNumber']".into()
}
fn d_flight_type_dropdown() -> String {
    "select[id*='TravelType']".into()
}
fn d_flight_class_dropdown() -> String {
    "select[id*='TicketClassCode']".into()
}
fn d_departure_city() -> String {
    "input[id*='DestinationFrom']".into()
}
fn d_arrival_city() -> String {
    "input[id*='DestinationTo']".into()
}
fn d_passenger_name() -> String {
    "input[id*='PassengerName']".into()
}
fn d_agency_field() -> String {
    "input[id*='agencyTravelAirfare']".into()
}
fn d_hotel_add_row() -> String {
    "a[title='Add Row']".into()
}
fn d_hotel_row_date() -> String {
    "input[id*='itemTbl:{row}:ChildStartDate']".into()
}
fn d_hotel_row_amount() -> String {
    "input[id*='itemTbl:{row}:ChildDailyAmountProf']".into()
}
fn d_attachment_dropzone() -> String {
    "[id*='pglDropZone'], [id*='cilDzMsg']".into()
}
fn d_attachment_input() -> String {
    "input[type='file'][id$='dzHfile']".into()
}
fn d_attachment_list() -> String {
    "div[id*=':lvAvsd']".into()
}

impl Config {
    /// Look up an allow-list entry by exact label.
    pub fn expense_type(&self, label: &str) -> Option<&ExpenseType> {
        self.expense_types.iter().find(|et| et.label == label)
    }

    /// Field-strategy category for a label; unknown labels are Generic.
    pub fn category_for(&self, label: &str) -> ExpenseCategory {
        self.expense_type(label)
            .map(|et| et.category)
            .unwrap_or_default()
    }
}
