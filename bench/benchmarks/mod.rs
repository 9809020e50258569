pub mod comparators;
