use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use super::*;

/// Scripted focus order: each `focus_anchor` restarts the walk, each
/// `tab_forward` advances one label. Position zero is the anchor
/// itself.
struct FakeFocus {
    anchor_label: String,
    tab_order: Vec<String>,
    pos: Mutex<usize>,
    anchor_calls: AtomicUsize,
    activations: AtomicUsize,
}

impl FakeFocus {
    fn new(tab_order: Vec<&str>) -> Self {
        Self {
            anchor_label: String::new(),
            tab_order: tab_order.into_iter().map(String::from).collect(),
            pos: Mutex::new(0),
            anchor_calls: AtomicUsize::new(0),
            activations: AtomicUsize::new(0),
        }
    }

    fn anchored_at(mut self, label: &str) -> Self {
        self.anchor_label = label.to_string();
        self
    }
}

#[async_trait]
impl FocusDriver for FakeFocus {
    async fn focus_anchor(&self, _anchor: &str) -> Result<(), InteractError> {
        self.anchor_calls.fetch_add(1, Ordering::SeqCst);
        *self.pos.lock().unwrap() = 0;
        Ok(())
    }

    async fn tab_forward(&self) -> Result<(), InteractError> {
        *self.pos.lock().unwrap() += 1;
        Ok(())
    }

    async fn focused_label(&self) -> Result<String, InteractError> {
        let pos = *self.pos.lock().unwrap();
        match pos {
            0 => Ok(self.anchor_label.clone()),
            n => Ok(self.tab_order.get(n - 1).cloned().unwrap_or_default()),
        }
    }

    async fn activate_focused(&self, _hold: Duration) -> Result<(), InteractError> {
        self.activations.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

fn filler_walk(target: &str, target_position: usize) -> Vec<String> {
    let mut order: Vec<String> = (0..target_position - 1)
        .map(|i| format!("Other Control {i}"))
        .collect();
    order.push(target.to_string());
    order
}

#[tokio::test]
async fn test_activation_succeeds_first_try() {
    let driver = FakeFocus::new(vec!["Skip Me", "Create Item", "Too Far"]);
    activate_by_label(&driver, "Expense Report", "Create Item", || async { Ok(true) })
        .await
        .unwrap();
    assert_eq!(driver.activations.load(Ordering::SeqCst), 1);
    assert_eq!(driver.anchor_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_anchor_control_activates_without_tabbing() {
    // A control may anchor on its own label; no walk is needed.
    let driver = FakeFocus::new(vec!["Other Control"]).anchored_at("Create Item");
    activate_by_label(&driver, "Create Item", "Create Item", || async { Ok(true) })
        .await
        .unwrap();
    assert_eq!(driver.activations.load(Ordering::SeqCst), 1);
    assert_eq!(*driver.pos.lock().unwrap(), 0);
}

#[tokio::test]
async fn test_control_at_final_walk_position_is_reached() {
    let order = filler_walk("Save and Close", MAX_TAB_WALK);
    let driver = FakeFocus::new(order.iter().map(String::as_str).collect());
    activate_by_label(&driver, "anchor", "Save and Close", || async { Ok(true) })
        .await
        .unwrap();
    assert_eq!(driver.activations.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_control_one_past_the_walk_is_not_found() {
    let order = filler_walk("Save and Close", MAX_TAB_WALK + 1);
    let driver = FakeFocus::new(order.iter().map(String::as_str).collect());
    let err = activate_by_label(&driver, "anchor", "Save and Close", || async { Ok(true) })
        .await
        .unwrap_err();
    assert!(matches!(err, InteractError::ControlNotFound { .. }));
    assert_eq!(driver.activations.load(Ordering::SeqCst), 0);
    // An exhausted walk fails on the first pass; retries are reserved
    // for activations that had no visible effect.
    assert_eq!(driver.anchor_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_label_match_is_case_insensitive_substring() {
    let driver = FakeFocus::new(vec!["  CREATE ANOTHER item  "]);
    activate_by_label(&driver, "anchor", "Create Another", || async { Ok(true) })
        .await
        .unwrap();
}

#[tokio::test]
async fn test_failed_verification_retries_then_succeeds() {
    let driver = FakeFocus::new(vec!["Create Item"]);
    let verify_calls = AtomicUsize::new(0);
    activate_by_label(&driver, "anchor", "Create Item", || async {
        // Page reacts only on the third activation.
        Ok(verify_calls.fetch_add(1, Ordering::SeqCst) + 1 == 3)
    })
    .await
    .unwrap();
    assert_eq!(driver.activations.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_exhausted_retries_report_activation_failure() {
    let driver = FakeFocus::new(vec!["Create Item"]);
    let err = activate_by_label(&driver, "anchor", "Create Item", || async { Ok(false) })
        .await
        .unwrap_err();
    assert!(matches!(err, InteractError::ActivationFailed { .. }));
    assert_eq!(
        driver.activations.load(Ordering::SeqCst),
        ACTIVATION_ATTEMPTS
    );
}

/// What a fallback step does when the ladder tries it: nothing, or
/// commit a specific option and claim success.
#[derive(Clone, Copy)]
enum Step {
    Miss,
    Commit(&'static str, &'static str),
}

struct FakeDropdown {
    labels: Vec<String>,
    on_label: Step,
    on_value: Step,
    on_index: Step,
    committed: Mutex<Option<(String, String)>>,
    calls: Mutex<Vec<String>>,
}

impl FakeDropdown {
    fn new(labels: Vec<&str>, on_label: Step, on_value: Step, on_index: Step) -> Self {
        Self {
            labels: labels.into_iter().map(String::from).collect(),
            on_label,
            on_value,
            on_index,
            committed: Mutex::new(None),
            calls: Mutex::new(Vec::new()),
        }
    }

    fn apply(&self, step: Step) -> bool {
        match step {
            Step::Miss => false,
            Step::Commit(label, value) => {
                *self.committed.lock().unwrap() = Some((label.to_string(), value.to_string()));
                true
            }
        }
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl DropdownDriver for FakeDropdown {
    async fn option_labels(&self, _field: &str) -> Result<Vec<String>, InteractError> {
        Ok(self.labels.clone())
    }

    async fn select_label(&self, _field: &str, label: &str) -> Result<bool, InteractError> {
        self.calls.lock().unwrap().push(format!("label:{label}"));
        Ok(self.apply(self.on_label))
    }

    async fn select_value(&self, _field: &str, value: &str) -> Result<bool, InteractError> {
        self.calls.lock().unwrap().push(format!("value:{value}"));
        Ok(self.apply(self.on_value))
    }

    async fn select_index(&self, _field: &str, index: usize) -> Result<bool, InteractError> {
        self.calls.lock().unwrap().push(format!("index:{index}"));
        Ok(self.apply(self.on_index))
    }

    async fn committed_option(
        &self,
        _field: &str,
    ) -> Result<Option<(String, String)>, InteractError> {
        Ok(self.committed.lock().unwrap().clone())
    }
}

#[tokio::test]
async fn test_dropdown_exact_label_short_circuits() {
    let driver = FakeDropdown::new(
        vec!["Airfare"],
        Step::Commit("Airfare", "AIRFARE"),
        Step::Miss,
        Step::Miss,
    );
    select_dropdown_by_label(&driver, "select.type", "Airfare")
        .await
        .unwrap();
    assert_eq!(driver.calls(), vec!["label:Airfare"]);
}

#[tokio::test]
async fn test_dropdown_falls_back_to_value_then_index() {
    let driver = FakeDropdown::new(
        vec!["Hotel", "Meals - Breakfast", "Airfare (Domestic)"],
        Step::Miss,
        Step::Miss,
        Step::Commit("Airfare (Domestic)", "AIRFARE_DOM"),
    );
    select_dropdown_by_label(&driver, "select.type", "airfare")
        .await
        .unwrap();
    assert_eq!(
        driver.calls(),
        vec!["label:airfare", "value:airfare", "index:2"]
    );
}

#[tokio::test]
async fn test_dropdown_rejects_wrongly_committed_option() {
    // Label addressing claims success but the control lands on a
    // sibling option; the ladder must keep going until the read-back
    // matches what was asked for.
    let driver = FakeDropdown::new(
        vec!["Airfare (Domestic)", "Airfare (International)"],
        Step::Commit("Airfare (Domestic)", "AIRFARE_DOM"),
        Step::Miss,
        Step::Commit("Airfare (International)", "AIRFARE_INTL"),
    );
    select_dropdown_by_label(&driver, "select.type", "Airfare (International)")
        .await
        .unwrap();
    assert_eq!(
        driver.calls(),
        vec![
            "label:Airfare (International)",
            "value:Airfare (International)",
            "index:1"
        ]
    );
    assert_eq!(
        driver.committed.lock().unwrap().clone(),
        Some((
            "Airfare (International)".to_string(),
            "AIRFARE_INTL".to_string()
        ))
    );
}

#[tokio::test]
async fn test_dropdown_wrong_commit_everywhere_fails() {
    let driver = FakeDropdown::new(
        vec!["Airfare (Domestic)", "Airfare (International)"],
        Step::Commit("Airfare (Domestic)", "AIRFARE_DOM"),
        Step::Commit("Airfare (Domestic)", "AIRFARE_DOM"),
        Step::Commit("Airfare (Domestic)", "AIRFARE_DOM"),
    );
    let err = select_dropdown_by_label(&driver, "select.type", "Airfare (International)")
        .await
        .unwrap_err();
    assert!(matches!(err, InteractError::SelectionFailed { .. }));
}

#[tokio::test]
async fn test_dropdown_no_match_fails_with_field_context() {
    let driver = FakeDropdown::new(vec!["Hotel", "Meals"], Step::Miss, Step::Miss, Step::Miss);
    let err = select_dropdown_by_label(&driver, "select.type", "Parking")
        .await
        .unwrap_err();
    match err {
        InteractError::SelectionFailed { field, label } => {
            assert_eq!(field, "select.type");
            assert_eq!(label, "Parking");
        }
        other => panic!("expected SelectionFailed, got {other:?}"),
    }
}

#[tokio::test]
async fn test_wait_for_returns_probe_value() {
    let tries = AtomicUsize::new(0);
    let value = wait_for(
        "report list",
        Duration::from_secs(1),
        Duration::from_millis(1),
        || async {
            if tries.fetch_add(1, Ordering::SeqCst) >= 2 {
                Ok(Some(42))
            } else {
                Ok(None)
            }
        },
    )
    .await
    .unwrap();
    assert_eq!(value, 42);
}

#[tokio::test]
async fn test_wait_for_times_out() {
    let err = wait_for(
        "login page",
        Duration::from_millis(20),
        Duration::from_millis(5),
        || async { Ok(None::<()>) },
    )
    .await
    .unwrap_err();
    match err {
        InteractError::Timeout { what } => assert_eq!(what, "login page"),
        other => panic!("expected Timeout, got {other:?}"),
    }
}
