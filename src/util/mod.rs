pub mod identity_set;
