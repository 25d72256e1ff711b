//! Services layer - Business logic
//!
//! - [`sections`]: static catalogue of the page's list sections
//! - [`ordering`]: per-section ordering rules
//! - [`loader`]: fetch, memoise, order and degrade section content
//! - [`visibility`]: fail-open section visibility
//! - [`page`]: concurrent home page and blog post assembly
//! - [`admin`]: validated writes with cache invalidation

pub mod admin;
pub mod loader;
pub mod ordering;
pub mod page;
pub mod sections;
pub mod visibility;

pub use admin::{AdminError, AdminService};
pub use loader::{SectionContent, SectionLoader, SingletonContent};
pub use ordering::OrderingRule;
pub use page::PageService;
pub use sections::{spec_for, spec_for_collection, SectionSpec, SECTIONS};
pub use visibility::VisibilityResolver;
