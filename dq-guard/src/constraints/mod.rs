//! Constraint implementations.
//!
//! | kind | evaluates | reads |
//! |------|-----------|-------|
//! | [`SizeConstraint`] | row count against an [`Assertion`] | `size` metric |
//! | [`CompletenessConstraint`] | non-null share reaches a threshold | `completeness` metric |
//! | [`UniquenessConstraint`] | distinct count equals row count | `count_distinct` metric |
//! | [`ContainedInConstraint`] | values belong to an allowed set | rows |
//! | [`SatisfiesConstraint`] | a SQL predicate holds for every row | rows (DataFusion) |
//! | [`NumericRangeConstraint`] | values lie within `[min, max]` | `minimum`/`maximum`, or rows |
//! | [`LengthRangeConstraint`] | string lengths lie within `[min, max]` | `min_length`/`max_length` |
//! | [`ColumnsMatchConstraint`] | the ordered column list | schema |
//!
//! Every kind also has a declarative [`ConstraintSpec`] form.

mod assertion;
mod columns;
mod completeness;
mod custom_sql;
mod length;
mod range;
mod size;
mod spec;
mod uniqueness;
mod values;

pub use assertion::Assertion;
pub use columns::ColumnsMatchConstraint;
pub use completeness::CompletenessConstraint;
pub use custom_sql::{validate_sql_expression, SatisfiesConstraint};
pub use length::LengthRangeConstraint;
pub use range::NumericRangeConstraint;
pub use size::SizeConstraint;
pub use spec::ConstraintSpec;
pub use uniqueness::UniquenessConstraint;
pub use values::ContainedInConstraint;
