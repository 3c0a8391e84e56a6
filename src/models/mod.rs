pub mod acknowledgment;
pub mod alert;
pub mod enums;
pub mod filters;
pub mod knowledge;
pub mod medication;
pub mod observation;
pub mod patient;
pub mod surveillance_run;
pub mod vital_sign;

pub use acknowledgment::*;
pub use alert::*;
pub use filters::*;
pub use knowledge::*;
pub use medication::*;
pub use observation::*;
pub use patient::*;
pub use surveillance_run::*;
pub use vital_sign::*;
