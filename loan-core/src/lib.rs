pub mod assemble;
pub mod csv_import;
pub mod fields;
pub mod gateway;
pub mod models;
pub mod submit;
pub mod validate;
pub mod wizard;

pub use assemble::{ValidationError, assemble};
pub use gateway::{
    CredentialProvider, FieldRejection, FileUpload, GatewayError, NoCredentials, StaticCredentials,
    StoredFile, SubmissionGateway,
};
pub use models::*;
pub use submit::{FileOutcome, SubmissionOutcome, submit_application};
pub use validate::{FieldError, FieldRule, FieldSpec};
pub use wizard::{Advance, StepDef, Wizard, loan_steps};
