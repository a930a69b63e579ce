//! Acceptance criteria: configuration and evaluation.

mod config;
mod evaluator;

pub use config::{
    CriteriaConfig, CriteriaError, CriteriaSource, FileCriteriaSource,
    DEFAULT_IC_TITLE_REQUIREMENTS, DEFAULT_MIN_SALARY,
};
pub use evaluator::{
    check_remote, check_salary, check_title_level, CriteriaEvaluator,
    MISSING_EXTRACTION_REASON,
};
