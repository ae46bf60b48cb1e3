//! Domain models for the test management core.
//!
//! # Core Concepts
//!
//! - [`TestFolder`]: A folder of test cases. Folders form a tree per project.
//! - [`TestCase`]: A manually executed test case, owned by one folder.
//! - [`TestCaseVersion`]: A version of a test case; exactly one is the default.
//! - [`ManualScenario`]: The body of a version, either free text or ordered steps.
//! - [`TestPlan`] and [`Milestone`]: Planning entities.
//! - [`Dataset`] and [`Environment`]: Parameter rows bound to environments.
//!
//! ## Attributes
//!
//! [`Attribute`] rows are shared tags, unique by key. Owners reference them through
//! [`OwnerAttribute`] join records carrying a per-owner value.
//!
//! Each entity has an `*Input` type used for create, update and patch. Update
//! copies every field (absent optional fields are cleared); patch copies only
//! the fields that are present.

mod attribute;
mod dataset;
mod folder;
mod scenario;
mod test_case;
mod test_plan;
mod version;

pub use attribute::*;
pub use dataset::*;
pub use folder::*;
pub use scenario::*;
pub use test_case::*;
pub use test_plan::*;
pub use version::*;
