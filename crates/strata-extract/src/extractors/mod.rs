pub mod dbt;
pub mod dsx;
pub mod dtsx;
pub mod sql;
