// Entity models for the clinic registry
//
// Visit and Patient are the value types the department reconstructs
// from flat rows; Note carries the separately loaded notes dataset.

pub mod note;
pub mod patient;
pub mod visit;

pub use note::{Note, NotesRegistry};
pub use patient::{Demographics, Patient};
pub use visit::{parse_iso_date, parse_visit_date, Visit};
