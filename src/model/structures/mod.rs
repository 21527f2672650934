pub mod adjustment_kind;
pub mod contest_outcome;
pub mod rating_adjustment;
pub mod site;
