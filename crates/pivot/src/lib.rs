mod builder;
mod label;
mod state;
mod tree;

pub use self::builder::build_tree;
pub use self::label::format_label;
pub use self::state::{Dimensions, DimensionsPatch, PivotController, PivotEvent};
pub use self::tree::{Aggregate, HeaderAxis, HeaderNode, HeaderTree, NodeId};
