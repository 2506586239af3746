//! Validation predicates for wizard input, usable without a rendered form

use thiserror::Error;

use super::templates::route_declaration;

/// Local, synchronous validation failures. The display text is the message
/// shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Module name cannot be empty.")]
    EmptyModuleName,

    #[error("The Python code must include:\n{required}")]
    MissingRoute { required: String },
}

/// Check that the module source contains the route declaration for
/// `module_name` as a literal substring.
///
/// The name is used untrimmed, so an empty name requires the route for `/`.
pub fn validate_source(source_code: &str, module_name: &str) -> Result<(), ValidationError> {
    let required = route_declaration(module_name);
    if source_code.contains(&required) {
        Ok(())
    } else {
        Err(ValidationError::MissingRoute { required })
    }
}

/// Check that the module name is non-empty after trimming
pub fn validate_module_name(module_name: &str) -> Result<(), ValidationError> {
    if module_name.trim().is_empty() {
        Err(ValidationError::EmptyModuleName)
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_source_accepts_route_anywhere() {
        let source = "from flask import Flask\napp = Flask(__name__)\n\n\
                      @app.route('/Foo', methods=['POST'])\ndef run():\n    pass\n";
        assert!(validate_source(source, "Foo").is_ok());
    }

    #[test]
    fn test_validate_source_rejects_other_route() {
        let err = validate_source("@app.route('/Bar', methods=['POST'])", "Foo").unwrap_err();
        assert_eq!(
            err,
            ValidationError::MissingRoute {
                required: "@app.route('/Foo', methods=['POST'])".to_string()
            }
        );
        assert!(err
            .to_string()
            .ends_with("@app.route('/Foo', methods=['POST'])"));
    }

    #[test]
    fn test_validate_source_is_case_and_spacing_sensitive() {
        assert!(validate_source("@app.route('/Foo', methods=[\"POST\"])", "Foo").is_err());
        assert!(validate_source("@app.route('/foo', methods=['POST'])", "Foo").is_err());
    }

    #[test]
    fn test_validate_source_with_empty_name_uses_root_route() {
        assert!(validate_source("@app.route('/', methods=['POST'])", "").is_ok());
        assert!(validate_source("", "").is_err());
    }

    #[test]
    fn test_validate_module_name() {
        assert_eq!(
            validate_module_name(""),
            Err(ValidationError::EmptyModuleName)
        );
        assert_eq!(
            validate_module_name(" \t "),
            Err(ValidationError::EmptyModuleName)
        );
        assert!(validate_module_name("Foo").is_ok());
    }
}
