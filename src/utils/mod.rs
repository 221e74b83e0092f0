pub mod non_max;
