pub mod background_pass;
pub mod key_pass;
pub mod pass;
