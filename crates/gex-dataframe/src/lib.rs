//! # gex-dataframe: columnar views over engineering-domain objects
//!
//! Exposes collections of domain items as language-agnostic columnar tables
//! and applies externally supplied columnar edits back onto them.
//!
//! ## The two-way contract
//!
//! - **Read path:** a [`DataframeMapper`] projects a container's items into
//!   ordered [`Series`], one per declared column surviving the
//!   [`AttributeFilter`]. Each invocation iterates the items exactly once.
//! - **Write path:** an [`UpdatingDataframe`] carries one or two index
//!   columns plus value columns; `update_series` resolves each row to an
//!   item and applies the values through registered setters.
//!
//! Tables produced here are the sole boundary consumed by any downstream
//! transport; marshalling itself lives outside this crate.

pub mod filter;
pub mod mapper;
pub mod series;
pub mod update;

pub use filter::AttributeFilter;
pub use mapper::{CapabilityColumns, DataframeMapper, DataframeMapperBuilder};
pub use series::{Series, SeriesDataType, SeriesMetadata, SeriesValues};
pub use update::UpdatingDataframe;
