//! Outbound reply texts

use super::state::CapturedFields;

pub const WELCOME: &str = "Welcome! Please enter name:";
pub const ASK_LOCATION: &str = "Great! Set address?";
pub const SAVE_FAILED: &str = "⚠️ Failed to save your data. Please try again.";
pub const CANCELLED: &str = "Operation cancelled.";

/// Acknowledge the name and ask for the phone number
pub fn ask_phone(name: &str) -> String {
    format!("ok {name}! enter phone number?")
}

/// Confirmation echoing every captured field
pub fn saved(fields: &CapturedFields) -> String {
    format!(
        "✅ Your information has been saved!\nName: {}\nPhoneNumber: {}\nLocation: {}",
        fields.name, fields.phone_number, fields.location
    )
}
