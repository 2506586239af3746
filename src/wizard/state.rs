//! Wizard state record and its reducer

use std::collections::BTreeMap;

use super::templates::{
    metadata_document, metadata_file_name, route_declaration, source_file_name,
    CONTAINER_SPEC_FILE, DEPENDENCY_SPEC_FILE,
};
use super::validate::{validate_source, ValidationError};
use crate::store::CreateModuleRequest;

/// Which step of the module wizard we're on
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub enum WizardStep {
    /// Module name, algorithm type and category
    #[default]
    Identity,
    /// Python source of the module
    SourceCode,
    /// Metadata JSON document
    Metadata,
    /// Dockerfile
    ContainerSpec,
    /// requirements.txt; module creation is available here
    DependencySpec,
}

impl WizardStep {
    pub fn all() -> &'static [WizardStep] {
        &[
            WizardStep::Identity,
            WizardStep::SourceCode,
            WizardStep::Metadata,
            WizardStep::ContainerSpec,
            WizardStep::DependencySpec,
        ]
    }

    /// Step number, 1 through 5
    pub fn number(self) -> u8 {
        match self {
            WizardStep::Identity => 1,
            WizardStep::SourceCode => 2,
            WizardStep::Metadata => 3,
            WizardStep::ContainerSpec => 4,
            WizardStep::DependencySpec => 5,
        }
    }

    pub fn from_number(number: u8) -> Option<Self> {
        match number {
            1 => Some(WizardStep::Identity),
            2 => Some(WizardStep::SourceCode),
            3 => Some(WizardStep::Metadata),
            4 => Some(WizardStep::ContainerSpec),
            5 => Some(WizardStep::DependencySpec),
            _ => None,
        }
    }

    /// Following step, staying on the last one
    pub fn next(self) -> Self {
        Self::from_number(self.number() + 1).unwrap_or(self)
    }

    /// Preceding step, staying on the first one
    pub fn prev(self) -> Self {
        Self::from_number(self.number() - 1).unwrap_or(self)
    }

    pub fn is_first(self) -> bool {
        self == WizardStep::Identity
    }

    pub fn is_final(self) -> bool {
        self == WizardStep::DependencySpec
    }

    pub fn title(self) -> &'static str {
        match self {
            WizardStep::Identity => "Module",
            WizardStep::SourceCode => "Source",
            WizardStep::Metadata => "Metadata",
            WizardStep::ContainerSpec => "Dockerfile",
            WizardStep::DependencySpec => "Requirements",
        }
    }

    pub fn instructions(self) -> &'static str {
        match self {
            WizardStep::Identity => {
                "Enter the name of the module you want to create, the algorithm type and the \
                 module category. Fill out all fields before proceeding to the next step."
            }
            WizardStep::SourceCode => {
                "Enter the Python code for your anonymization module using Flask APIs."
            }
            WizardStep::Metadata => {
                "Fill in the metadata explaining your anonymization module inside the double \
                 quotes provided."
            }
            WizardStep::ContainerSpec => {
                "Provide the Dockerfile used to containerize your module. Make sure it runs \
                 your module properly."
            }
            WizardStep::DependencySpec => {
                "Enter the Python dependencies of your module in requirements.txt format. \
                 They are installed when the module is deployed."
            }
        }
    }
}

/// A single transition of the wizard state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WizardAction {
    SetModuleName(String),
    SetAlgorithmType(String),
    SetModuleCategory(String),
    SetSourceCode(String),
    SetMetadataDocument(String),
    SetContainerSpec(String),
    SetDependencySpec(String),
    /// Move forward one step
    Advance,
    /// Move forward one step, checking the source when leaving step 2
    AdvanceWithValidation,
    /// Move back one step
    Retreat,
    /// Return to the initial empty state
    Reset,
}

/// All field values of the wizard plus the current step.
///
/// Snapshots are immutable; [`WizardState::reduce`] produces the next one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WizardState {
    pub module_name: String,
    pub algorithm_type: String,
    pub module_category: String,
    pub source_code: String,
    pub metadata_document: String,
    pub container_spec: String,
    pub dependency_spec: String,
    pub step: WizardStep,
}

impl WizardState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply `action` and return the resulting snapshot.
    ///
    /// Derived fields react to the transition afterwards: the metadata
    /// document is regenerated whenever the module name changes, and the
    /// source is overwritten with the route declaration whenever step 2 is
    /// reached (or the name changes on it) with a non-empty name.
    pub fn reduce(&self, action: WizardAction) -> Result<WizardState, ValidationError> {
        let mut next = self.clone();

        match action {
            WizardAction::SetModuleName(value) => next.module_name = value,
            WizardAction::SetAlgorithmType(value) => next.algorithm_type = value,
            WizardAction::SetModuleCategory(value) => next.module_category = value,
            WizardAction::SetSourceCode(value) => next.source_code = value,
            WizardAction::SetMetadataDocument(value) => next.metadata_document = value,
            WizardAction::SetContainerSpec(value) => next.container_spec = value,
            WizardAction::SetDependencySpec(value) => next.dependency_spec = value,
            WizardAction::Advance => next.step = self.step.next(),
            WizardAction::AdvanceWithValidation => {
                if self.step == WizardStep::SourceCode {
                    validate_source(&self.source_code, &self.module_name)?;
                }
                next.step = self.step.next();
            }
            WizardAction::Retreat => next.step = self.step.prev(),
            WizardAction::Reset => next = WizardState::default(),
        }

        next.react_to(self);
        Ok(next)
    }

    fn react_to(&mut self, previous: &WizardState) {
        let name_changed = self.module_name != previous.module_name;

        if name_changed {
            self.metadata_document = metadata_document(&self.module_name);
        }

        let entered_source_step =
            self.step == WizardStep::SourceCode && previous.step != WizardStep::SourceCode;
        if self.step == WizardStep::SourceCode
            && !self.module_name.is_empty()
            && (entered_source_step || name_changed)
        {
            self.source_code = self.required_route();
        }
    }

    /// Route declaration the source must contain for the current name
    pub fn required_route(&self) -> String {
        route_declaration(&self.module_name)
    }

    /// Files to persist, keyed by file name
    pub fn files(&self) -> BTreeMap<String, String> {
        BTreeMap::from([
            (
                source_file_name(&self.module_name),
                self.source_code.clone(),
            ),
            (
                metadata_file_name(&self.module_name),
                self.metadata_document.clone(),
            ),
            (
                CONTAINER_SPEC_FILE.to_string(),
                self.container_spec.clone(),
            ),
            (
                DEPENDENCY_SPEC_FILE.to_string(),
                self.dependency_spec.clone(),
            ),
        ])
    }

    /// Assemble the payload handed to the module store
    pub fn to_request(&self) -> CreateModuleRequest {
        CreateModuleRequest {
            module_name: self.module_name.clone(),
            algorithm_type: self.algorithm_type.clone(),
            module_category: self.module_category.clone(),
            files: self.files(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at_step(step: WizardStep) -> WizardState {
        WizardState {
            step,
            ..WizardState::default()
        }
    }

    fn reduce_all(state: WizardState, actions: Vec<WizardAction>) -> WizardState {
        actions
            .into_iter()
            .fold(state, |s, a| s.reduce(a).unwrap())
    }

    #[test]
    fn test_step_numbers_round_trip() {
        for step in WizardStep::all() {
            assert_eq!(WizardStep::from_number(step.number()), Some(*step));
        }
        assert_eq!(WizardStep::from_number(0), None);
        assert_eq!(WizardStep::from_number(6), None);
    }

    #[test]
    fn test_advance_is_clamped_at_five() {
        for step in WizardStep::all() {
            let next = at_step(*step).reduce(WizardAction::Advance).unwrap();
            assert_eq!(next.step.number(), (step.number() + 1).min(5));
        }
    }

    #[test]
    fn test_retreat_is_clamped_at_one() {
        for step in WizardStep::all() {
            let prev = at_step(*step).reduce(WizardAction::Retreat).unwrap();
            assert_eq!(prev.step.number(), step.number().saturating_sub(1).max(1));
        }
    }

    #[test]
    fn test_reduce_leaves_previous_snapshot_untouched() {
        let first = WizardState::new();
        let second = first
            .reduce(WizardAction::SetModuleName("Foo".into()))
            .unwrap();
        assert_eq!(first, WizardState::default());
        assert_eq!(second.module_name, "Foo");
    }

    #[test]
    fn test_name_change_regenerates_metadata() {
        let state = reduce_all(
            WizardState::new(),
            vec![
                WizardAction::SetModuleName("Foo".into()),
                WizardAction::SetMetadataDocument("edited".into()),
                WizardAction::SetModuleName("Foob".into()),
            ],
        );
        assert_eq!(state.metadata_document, metadata_document("Foob"));
    }

    #[test]
    fn test_same_name_keeps_edited_metadata() {
        let state = reduce_all(
            WizardState::new(),
            vec![
                WizardAction::SetModuleName("Foo".into()),
                WizardAction::SetMetadataDocument("edited".into()),
                WizardAction::SetModuleName("Foo".into()),
            ],
        );
        assert_eq!(state.metadata_document, "edited");
    }

    #[test]
    fn test_whitespace_name_clears_metadata() {
        let state = reduce_all(
            WizardState::new(),
            vec![
                WizardAction::SetModuleName("Foo".into()),
                WizardAction::SetModuleName("  ".into()),
            ],
        );
        assert_eq!(state.metadata_document, "");
    }

    #[test]
    fn test_entering_step_two_prefills_route() {
        let state = reduce_all(
            WizardState::new(),
            vec![
                WizardAction::SetModuleName("Foo".into()),
                WizardAction::Advance,
            ],
        );
        assert_eq!(state.step, WizardStep::SourceCode);
        assert_eq!(state.source_code, "@app.route('/Foo', methods=['POST'])");
    }

    #[test]
    fn test_entering_step_two_without_name_keeps_source() {
        let state = reduce_all(
            WizardState::new(),
            vec![
                WizardAction::SetSourceCode("print()".into()),
                WizardAction::Advance,
            ],
        );
        assert_eq!(state.source_code, "print()");
    }

    #[test]
    fn test_renaming_and_returning_overwrites_source_edits() {
        let state = reduce_all(
            WizardState::new(),
            vec![
                WizardAction::SetModuleName("A".into()),
                WizardAction::Advance,
                WizardAction::SetSourceCode("my edits\n@app.route('/A', methods=['POST'])".into()),
                WizardAction::Retreat,
                WizardAction::SetModuleName("B".into()),
                WizardAction::Advance,
            ],
        );
        assert_eq!(state.source_code, "@app.route('/B', methods=['POST'])");
    }

    #[test]
    fn test_retreating_onto_step_two_reapplies_template() {
        let state = reduce_all(
            WizardState::new(),
            vec![
                WizardAction::SetModuleName("A".into()),
                WizardAction::Advance,
                WizardAction::SetSourceCode("custom @app.route('/A', methods=['POST'])".into()),
                WizardAction::AdvanceWithValidation,
                WizardAction::Retreat,
            ],
        );
        assert_eq!(state.step, WizardStep::SourceCode);
        assert_eq!(state.source_code, "@app.route('/A', methods=['POST'])");
    }

    #[test]
    fn test_advance_with_validation_blocks_without_route() {
        let state = reduce_all(
            WizardState::new(),
            vec![
                WizardAction::SetModuleName("Foo".into()),
                WizardAction::Advance,
                WizardAction::SetSourceCode("def run(): pass".into()),
            ],
        );
        let err = state
            .reduce(WizardAction::AdvanceWithValidation)
            .unwrap_err();
        assert_eq!(
            err,
            ValidationError::MissingRoute {
                required: "@app.route('/Foo', methods=['POST'])".into()
            }
        );
        assert_eq!(state.step, WizardStep::SourceCode);
    }

    #[test]
    fn test_advance_with_validation_passes_with_route() {
        let state = reduce_all(
            WizardState::new(),
            vec![
                WizardAction::SetModuleName("Foo".into()),
                WizardAction::Advance,
                WizardAction::SetSourceCode(
                    "@app.route('/Foo', methods=['POST'])\ndef run():\n    return 'ok'".into(),
                ),
                WizardAction::AdvanceWithValidation,
            ],
        );
        assert_eq!(state.step, WizardStep::Metadata);
    }

    #[test]
    fn test_advance_with_validation_ignores_other_steps() {
        let state = at_step(WizardStep::Metadata)
            .reduce(WizardAction::AdvanceWithValidation)
            .unwrap();
        assert_eq!(state.step, WizardStep::ContainerSpec);
    }

    #[test]
    fn test_reset_returns_to_initial_state() {
        let state = reduce_all(
            WizardState::new(),
            vec![
                WizardAction::SetModuleName("Foo".into()),
                WizardAction::SetAlgorithmType("k-anonymity".into()),
                WizardAction::Advance,
                WizardAction::Advance,
                WizardAction::Reset,
            ],
        );
        assert_eq!(state, WizardState::default());
    }

    #[test]
    fn test_to_request_maps_four_files() {
        let state = reduce_all(
            WizardState::new(),
            vec![
                WizardAction::SetModuleName("Foo".into()),
                WizardAction::SetAlgorithmType("perturbation".into()),
                WizardAction::SetModuleCategory("numeric".into()),
                WizardAction::SetContainerSpec("FROM python:3.11".into()),
                WizardAction::SetDependencySpec("flask".into()),
            ],
        );
        let request = state.to_request();
        assert_eq!(request.module_name, "Foo");
        assert_eq!(request.algorithm_type, "perturbation");
        assert_eq!(request.module_category, "numeric");
        let keys: Vec<&str> = request.files.keys().map(String::as_str).collect();
        assert_eq!(
            keys,
            vec!["Dockerfile", "Foo.json", "Foo.py", "requirements.txt"]
        );
        assert_eq!(request.files["Dockerfile"], "FROM python:3.11");
        assert_eq!(request.files["Foo.json"], metadata_document("Foo"));
    }
}
