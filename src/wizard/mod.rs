//! Module creation wizard: five steps of data entry ending in a single
//! create call against a [`ModuleStore`].

mod state;
pub mod templates;
pub mod validate;

pub use state::{WizardAction, WizardState, WizardStep};
pub use validate::{validate_module_name, validate_source, ValidationError};

use std::fmt;

use thiserror::Error;

use crate::store::{CreateModuleRequest, ModuleStore, StoreError};

/// Callback fired once after each successful module creation
pub type CreatedCallback = Box<dyn FnMut() + Send>;

/// Errors returned when submitting the wizard
#[derive(Debug, Error)]
pub enum SubmitError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Modules can only be created from the last step.")]
    NotAtFinalStep,

    #[error("A module is already being created.")]
    InFlight,

    #[error("Failed to create module. Ensure the module name is unique and try again.")]
    Persistence(#[source] StoreError),
}

impl SubmitError {
    /// Store-specific advice to show after the generic message
    pub fn hint(&self) -> Option<String> {
        match self {
            SubmitError::Persistence(e) => e.hint(),
            _ => None,
        }
    }
}

/// Successful submission. Receiving it is the signal to close the dialog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Created {
    pub module_name: String,
}

impl Created {
    /// Success notice for the user
    pub fn message(&self) -> String {
        format!("Module \"{}\" created successfully!", self.module_name)
    }
}

/// Owns the wizard state for one dialog and drives submission.
///
/// Only one create call can be pending at a time.
pub struct ModuleWizard {
    state: WizardState,
    /// Name of the module whose create call is pending
    pending: Option<String>,
    on_created: Option<CreatedCallback>,
}

impl ModuleWizard {
    pub fn new() -> Self {
        Self {
            state: WizardState::new(),
            pending: None,
            on_created: None,
        }
    }

    /// Register the callback fired after each successful creation
    pub fn with_on_created(mut self, callback: impl FnMut() + Send + 'static) -> Self {
        self.on_created = Some(Box::new(callback));
        self
    }

    pub fn state(&self) -> &WizardState {
        &self.state
    }

    pub fn step(&self) -> WizardStep {
        self.state.step
    }

    /// Whether a create call is pending
    pub fn is_in_flight(&self) -> bool {
        self.pending.is_some()
    }

    /// Apply an action; on error the state is left as it was
    pub fn dispatch(&mut self, action: WizardAction) -> Result<(), ValidationError> {
        self.state = self.state.reduce(action)?;
        Ok(())
    }

    pub fn advance(&mut self) {
        if let Ok(next) = self.state.reduce(WizardAction::Advance) {
            self.state = next;
        }
    }

    pub fn advance_with_validation(&mut self) -> Result<(), ValidationError> {
        let result = self.dispatch(WizardAction::AdvanceWithValidation);
        if let Err(ref e) = result {
            tracing::debug!(step = self.step().number(), error = %e, "Advance blocked");
        }
        result
    }

    pub fn retreat(&mut self) {
        if let Ok(prev) = self.state.reduce(WizardAction::Retreat) {
            self.state = prev;
        }
    }

    /// Validate the wizard and mark a create call as pending.
    ///
    /// Returns the payload to hand to the store. Nothing changes on error.
    pub fn begin_submit(&mut self) -> Result<CreateModuleRequest, SubmitError> {
        if self.pending.is_some() {
            return Err(SubmitError::InFlight);
        }
        if !self.state.step.is_final() {
            return Err(SubmitError::NotAtFinalStep);
        }
        if let Err(e) = validate_module_name(&self.state.module_name) {
            tracing::debug!(error = %e, "Submit blocked");
            return Err(e.into());
        }

        let request = self.state.to_request();
        self.pending = Some(request.module_name.clone());
        tracing::info!(module = %request.module_name, "Creating module");
        Ok(request)
    }

    /// Record the outcome of the pending create call.
    ///
    /// On success the callback fires, the state resets and [`Created`] is
    /// returned. On failure the state is kept so the user can retry.
    pub fn finish_submit(
        &mut self,
        result: Result<(), StoreError>,
    ) -> Result<Created, SubmitError> {
        let module_name = self
            .pending
            .take()
            .unwrap_or_else(|| self.state.module_name.clone());

        match result {
            Ok(()) => {
                tracing::info!(module = %module_name, "Module created");
                if let Some(callback) = self.on_created.as_mut() {
                    callback();
                }
                self.state = WizardState::default();
                Ok(Created { module_name })
            }
            Err(e) => {
                tracing::error!(module = %module_name, error = %e, "Error creating module");
                Err(SubmitError::Persistence(e))
            }
        }
    }

    /// Validate, create the module through `store` and record the outcome
    pub async fn submit(&mut self, store: &dyn ModuleStore) -> Result<Created, SubmitError> {
        let request = self.begin_submit()?;
        let result = store.create(&request).await;
        self.finish_submit(result)
    }
}

impl Default for ModuleWizard {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ModuleWizard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleWizard")
            .field("state", &self.state)
            .field("pending", &self.pending)
            .field("on_created", &self.on_created.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    /// Store that records requests and answers with a fixed outcome
    #[derive(Default)]
    struct RecordingStore {
        requests: Mutex<Vec<CreateModuleRequest>>,
        fail: bool,
    }

    #[async_trait]
    impl ModuleStore for RecordingStore {
        fn name(&self) -> &str {
            "recording"
        }

        async fn create(&self, request: &CreateModuleRequest) -> Result<(), StoreError> {
            self.requests.lock().unwrap().push(request.clone());
            if self.fail {
                Err(StoreError::already_exists("recording", &request.module_name))
            } else {
                Ok(())
            }
        }

        async fn list(&self) -> Result<Vec<String>, StoreError> {
            Ok(Vec::new())
        }
    }

    fn filled_wizard(name: &str) -> ModuleWizard {
        let mut wizard = ModuleWizard::new();
        wizard
            .dispatch(WizardAction::SetModuleName(name.into()))
            .unwrap();
        wizard
            .dispatch(WizardAction::SetAlgorithmType("perturbation".into()))
            .unwrap();
        wizard
            .dispatch(WizardAction::SetModuleCategory("numeric".into()))
            .unwrap();
        wizard.advance_with_validation().unwrap();
        let route = wizard.state().required_route();
        wizard
            .dispatch(WizardAction::SetSourceCode(route))
            .unwrap();
        wizard.advance_with_validation().unwrap();
        wizard.advance();
        wizard
            .dispatch(WizardAction::SetContainerSpec("FROM python:3.11".into()))
            .unwrap();
        wizard.advance();
        wizard
            .dispatch(WizardAction::SetDependencySpec("flask\npandas".into()))
            .unwrap();
        wizard
    }

    #[test]
    fn test_filled_wizard_reaches_final_step() {
        let wizard = filled_wizard("Foo");
        assert_eq!(wizard.step(), WizardStep::DependencySpec);
        assert_eq!(
            wizard.state().source_code,
            "@app.route('/Foo', methods=['POST'])"
        );
    }

    #[tokio::test]
    async fn test_submit_with_empty_name_does_not_call_store() {
        let store = RecordingStore::default();
        let mut wizard = filled_wizard("");

        let err = wizard.submit(&store).await.unwrap_err();

        assert!(matches!(
            err,
            SubmitError::Validation(ValidationError::EmptyModuleName)
        ));
        assert!(store.requests.lock().unwrap().is_empty());
        assert_eq!(wizard.step(), WizardStep::DependencySpec);
        assert!(!wizard.is_in_flight());
    }

    #[tokio::test]
    async fn test_submit_success_resets_and_notifies_once() {
        let store = RecordingStore::default();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let mut wizard = filled_wizard("Foo").with_on_created(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        let created = wizard.submit(&store).await.unwrap();

        assert_eq!(created.module_name, "Foo");
        assert_eq!(created.message(), "Module \"Foo\" created successfully!");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(wizard.state(), &WizardState::default());
        assert!(!wizard.is_in_flight());

        let requests = store.requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        let files = &requests[0].files;
        assert_eq!(files.len(), 4);
        for key in ["Foo.py", "Foo.json", "Dockerfile", "requirements.txt"] {
            assert!(files.contains_key(key), "missing {key}");
        }
        assert_eq!(files["requirements.txt"], "flask\npandas");
    }

    #[tokio::test]
    async fn test_submit_failure_keeps_state() {
        let store = RecordingStore {
            fail: true,
            ..RecordingStore::default()
        };
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let mut wizard = filled_wizard("Foo").with_on_created(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        let before = wizard.state().clone();

        let err = wizard.submit(&store).await.unwrap_err();

        assert!(matches!(err, SubmitError::Persistence(_)));
        assert_eq!(
            err.to_string(),
            "Failed to create module. Ensure the module name is unique and try again."
        );
        assert!(err.hint().is_none());
        assert_eq!(wizard.state(), &before);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(!wizard.is_in_flight());

        // Retry goes through once the store accepts it
        let ok_store = RecordingStore::default();
        assert!(wizard.submit(&ok_store).await.is_ok());
    }

    #[test]
    fn test_begin_submit_rejects_second_request_while_pending() {
        let mut wizard = filled_wizard("Foo");

        assert!(wizard.begin_submit().is_ok());
        assert!(wizard.is_in_flight());
        assert!(matches!(wizard.begin_submit(), Err(SubmitError::InFlight)));

        assert!(wizard.finish_submit(Ok(())).is_ok());
        assert!(!wizard.is_in_flight());
    }

    #[test]
    fn test_begin_submit_requires_final_step() {
        let mut wizard = ModuleWizard::new();
        wizard
            .dispatch(WizardAction::SetModuleName("Foo".into()))
            .unwrap();
        assert!(matches!(
            wizard.begin_submit(),
            Err(SubmitError::NotAtFinalStep)
        ));
    }

    #[test]
    fn test_finish_submit_reports_pending_name() {
        let mut wizard = filled_wizard("Foo");
        wizard.begin_submit().unwrap();
        // Edits made while the call is pending do not change the reported name
        wizard.retreat();
        let created = wizard.finish_submit(Ok(())).unwrap();
        assert_eq!(created.module_name, "Foo");
    }

    #[test]
    fn test_debug_hides_callback() {
        let wizard = ModuleWizard::new().with_on_created(|| {});
        let rendered = format!("{wizard:?}");
        assert!(rendered.contains("on_created: true"));
    }
}
