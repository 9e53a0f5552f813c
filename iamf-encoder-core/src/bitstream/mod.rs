pub mod fixed_point;
pub mod leb128;
pub mod obu;
pub mod reader;
