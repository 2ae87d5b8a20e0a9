use strum::{Display, EnumIter, EnumString};

/// Runtime type tag of an indexed key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter)]
#[strum(ascii_case_insensitive)]
pub enum DataType {
    Int64,
    Float64,
    Varchar,
    Date,
}
