pub mod db;
pub mod demo_seed;
