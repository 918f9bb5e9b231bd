pub mod elastic_email;
pub mod smtp;
pub mod unisender;
