//! Multi-step application wizard.
//!
//! One wizard instance holds the state of one in-progress application: the
//! current step (1-based), and the validated data accumulated per step. The
//! step list is data, so presentation variants can differ without duplicating
//! the state machine.

use std::collections::BTreeMap;

use rust_decimal::Decimal;

use crate::validate::{FieldError, FieldSpec, validate_step};

/// One screen of the wizard, owning a subset of the total fields.
#[derive(Debug, Clone)]
pub struct StepDef {
    pub id: &'static str,
    pub title: &'static str,
    pub fields: Vec<FieldSpec>,
}

/// Result of a successful [`Wizard::advance`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    /// Moved to the given step (1-based).
    Next(usize),
    /// The final step validated; the caller should assemble and submit.
    /// The step index does not move past the last step.
    ReadyToSubmit,
}

/// The wizard state machine.
///
/// Mutated only through [`advance`](Self::advance), [`retreat`](Self::retreat)
/// and [`reset`](Self::reset); failed validation leaves both the step index
/// and the accumulated data untouched.
#[derive(Debug, Clone)]
pub struct Wizard {
    steps: Vec<StepDef>,
    current: usize,
    step_data: BTreeMap<&'static str, BTreeMap<String, String>>,
}

impl Wizard {
    /// Creates a wizard positioned on step 1 with no accumulated data.
    ///
    /// # Panics
    ///
    /// Panics if `steps` is empty; a wizard with no steps is a programming
    /// error.
    pub fn new(steps: Vec<StepDef>) -> Self {
        assert!(!steps.is_empty(), "wizard requires at least one step");
        Self {
            steps,
            current: 1,
            step_data: BTreeMap::new(),
        }
    }

    /// Current step index, always in `1..=step_count()`.
    pub fn current_step(&self) -> usize {
        self.current
    }

    pub fn step_count(&self) -> usize {
        self.steps.len()
    }

    /// Definition of the step the wizard is currently on.
    pub fn current_def(&self) -> &StepDef {
        &self.steps[self.current - 1]
    }

    pub fn steps(&self) -> &[StepDef] {
        &self.steps
    }

    /// Data previously entered for a step, for pre-filling on revisit.
    pub fn entered(&self, step_id: &str) -> Option<&BTreeMap<String, String>> {
        self.step_data.get(step_id)
    }

    /// Validates `input` against the current step's rules.
    ///
    /// On failure the wizard does not move and nothing is merged; all field
    /// errors are returned for display. On success the non-blank trimmed
    /// inputs replace the step's slot in the aggregate and the wizard either
    /// moves to the next step or, on the final step, reports
    /// [`Advance::ReadyToSubmit`].
    pub fn advance(&mut self, input: &BTreeMap<String, String>) -> Result<Advance, Vec<FieldError>> {
        let def = self.current_def();
        validate_step(&def.fields, input)?;

        // Blank entries are stored as absent, not as empty strings.
        let kept: BTreeMap<String, String> = input
            .iter()
            .filter_map(|(k, v)| {
                let trimmed = v.trim();
                if trimmed.is_empty() {
                    None
                } else {
                    Some((k.clone(), trimmed.to_string()))
                }
            })
            .collect();

        let step_id = def.id;
        self.step_data.insert(step_id, kept);

        if self.current == self.steps.len() {
            tracing::debug!(step = step_id, "final step complete");
            Ok(Advance::ReadyToSubmit)
        } else {
            self.current += 1;
            tracing::debug!(step = step_id, next = self.current, "step complete");
            Ok(Advance::Next(self.current))
        }
    }

    /// Steps back one screen, never below step 1. Data already entered for
    /// the step being left is kept.
    pub fn retreat(&mut self) {
        if self.current > 1 {
            self.current -= 1;
        }
    }

    /// Clears all accumulated data and returns to step 1.
    pub fn reset(&mut self) {
        self.current = 1;
        self.step_data.clear();
    }

    /// The accumulated per-step data.
    pub fn step_data(&self) -> &BTreeMap<&'static str, BTreeMap<String, String>> {
        &self.step_data
    }

    /// Flattens the per-step aggregate into a single field map for assembly.
    /// Later steps win on (unexpected) duplicate field names.
    pub fn flattened(&self) -> BTreeMap<String, String> {
        let mut flat = BTreeMap::new();
        for step in &self.steps {
            if let Some(data) = self.step_data.get(step.id) {
                flat.extend(data.iter().map(|(k, v)| (k.clone(), v.clone())));
            }
        }
        flat
    }
}

/// The default four-step loan application: personal details, employment,
/// loan terms and financial position, then document upload.
pub fn loan_steps() -> Vec<StepDef> {
    vec![
        StepDef {
            id: "personal",
            title: "Personal Information",
            fields: vec![
                FieldSpec::new("first_name", "First Name").required(),
                FieldSpec::new("last_name", "Last Name").required(),
                FieldSpec::new("email", "Email Address")
                    .required()
                    .pattern(r"^\S+@\S+$", "Invalid email"),
                FieldSpec::new("phone", "Phone Number")
                    .pattern(r"^[0-9]{10}$", "Must be 10 digits"),
                FieldSpec::new("date_of_birth", "Date of Birth"),
                FieldSpec::new("address", "Street Address"),
                FieldSpec::new("city", "City"),
                FieldSpec::new("state", "State"),
                FieldSpec::new("zip_code", "ZIP Code"),
            ],
        },
        StepDef {
            id: "employment",
            title: "Employment Information",
            fields: vec![
                FieldSpec::new("employment_status", "Employment Status"),
                FieldSpec::new("employer", "Employer Name"),
                FieldSpec::new("job_title", "Job Title"),
                FieldSpec::new("monthly_income", "Monthly Income").min(Decimal::from(1000)),
                FieldSpec::new("employment_duration", "Employment Duration"),
            ],
        },
        StepDef {
            id: "loan",
            title: "Loan Details & Financial Information",
            fields: vec![
                FieldSpec::new("loan_amount", "Loan Amount")
                    .required()
                    .min(Decimal::ONE),
                FieldSpec::new("loan_term", "Loan Term")
                    .required()
                    .min(Decimal::ONE),
                FieldSpec::new("loan_purpose", "Loan Purpose"),
                FieldSpec::new("total_assets", "Total Assets Value").min(Decimal::ZERO),
                FieldSpec::new("has_past_debts", "Do you have any past debts?")
                    .pattern(r"(?i)^(yes|no)$", "Answer yes or no"),
                FieldSpec::new("number_of_debts", "Number of Debts").min(Decimal::ONE),
                FieldSpec::new("has_emi", "Do you pay any EMI?")
                    .pattern(r"(?i)^(yes|no)$", "Answer yes or no"),
                FieldSpec::new("emi_amount", "Monthly EMI Amount").min(Decimal::ZERO),
            ],
        },
        StepDef {
            id: "documents",
            title: "Upload Transaction Data",
            // The transaction file travels outside the wizard; this step has
            // no rule-bearing fields.
            fields: vec![],
        },
    ]
}
