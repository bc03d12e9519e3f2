//! Routine call descriptions
//!
//! A [`ProcedureCall`] is the unchecked request a handler builds; preparing it
//! validates every identifier and yields the SQL text plus the values to bind.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::DataAccessError;
use crate::validation::{ValidatedParamName, ValidatedRoutineName};
use type_mapping::{placeholder, Parameters, PostgresValue};

/// Caller-declared shape of a routine's output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExpectedReturn {
    /// Discard all result sets
    None,
    /// First row of the first result set
    Single,
    /// Every result set, optionally keyed by name
    Multi,
}

impl ExpectedReturn {
    pub fn as_str(self) -> &'static str {
        match self {
            ExpectedReturn::None => "None",
            ExpectedReturn::Single => "Single",
            ExpectedReturn::Multi => "Multi",
        }
    }
}

impl fmt::Display for ExpectedReturn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExpectedReturn {
    type Err = DataAccessError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "None" => Ok(ExpectedReturn::None),
            "Single" => Ok(ExpectedReturn::Single),
            "Multi" => Ok(ExpectedReturn::Multi),
            other => Err(DataAccessError::InvalidExpectedReturn(other.to_string())),
        }
    }
}

/// A routine invocation: name, named arguments, output shape and optional result-set names
#[derive(Debug, Clone, PartialEq)]
pub struct ProcedureCall {
    routine: String,
    parameters: Parameters,
    expected: ExpectedReturn,
    result_set_names: Option<Vec<String>>,
}

impl ProcedureCall {
    pub fn new(routine: impl Into<String>, expected: ExpectedReturn) -> Self {
        Self {
            routine: routine.into(),
            parameters: Parameters::new(),
            expected,
            result_set_names: None,
        }
    }

    /// Add one named argument; a repeated name replaces the earlier value
    pub fn param(mut self, name: impl Into<String>, value: impl Into<PostgresValue>) -> Self {
        self.parameters.insert(name.into(), value.into());
        self
    }

    /// Merge a whole parameter mapping
    pub fn with_parameters(mut self, parameters: Parameters) -> Self {
        self.parameters.extend(parameters);
        self
    }

    /// Name the result sets of a `Multi` call, positionally
    pub fn result_sets<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.result_set_names = Some(names.into_iter().map(Into::into).collect());
        self
    }

    pub fn routine(&self) -> &str {
        &self.routine
    }

    pub fn parameters(&self) -> &Parameters {
        &self.parameters
    }

    pub fn expected(&self) -> ExpectedReturn {
        self.expected
    }

    pub fn result_set_names(&self) -> Option<&[String]> {
        self.result_set_names.as_deref()
    }

    /// Validate identifiers and freeze the call for execution
    pub fn prepare(&self) -> Result<PreparedCall, DataAccessError> {
        let routine = ValidatedRoutineName::new(&self.routine)?;
        let arguments = self
            .parameters
            .iter()
            .map(|(name, value)| Ok((ValidatedParamName::new(name)?, value.clone())))
            .collect::<Result<Vec<_>, DataAccessError>>()?;

        Ok(PreparedCall {
            routine,
            arguments,
            expected: self.expected,
            result_set_names: self.result_set_names.clone(),
        })
    }
}

/// A call whose identifiers have been validated
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedCall {
    routine: ValidatedRoutineName,
    arguments: Vec<(ValidatedParamName, PostgresValue)>,
    expected: ExpectedReturn,
    result_set_names: Option<Vec<String>>,
}

impl PreparedCall {
    pub fn routine(&self) -> &ValidatedRoutineName {
        &self.routine
    }

    pub fn expected(&self) -> ExpectedReturn {
        self.expected
    }

    pub fn result_set_names(&self) -> Option<&[String]> {
        self.result_set_names.as_deref()
    }

    pub fn arguments(&self) -> &[(ValidatedParamName, PostgresValue)] {
        &self.arguments
    }

    /// Statement text using named-argument notation, e.g.
    /// `SELECT * FROM news.get_news(id => $1, preview => NULL)`
    pub fn sql(&self) -> String {
        let mut index = 0;
        let arguments = self
            .arguments
            .iter()
            .map(|(name, value)| {
                if !value.is_null() {
                    index += 1;
                }
                format!("{} => {}", name, placeholder(value, index))
            })
            .collect::<Vec<_>>()
            .join(", ");

        format!("SELECT * FROM {}({})", self.routine, arguments)
    }

    /// Values to bind, in placeholder order
    pub fn bound_values(&self) -> impl Iterator<Item = &PostgresValue> {
        self.arguments
            .iter()
            .map(|(_, value)| value)
            .filter(|value| !value.is_null())
    }
}
