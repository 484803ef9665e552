// Sample generated replies with known sensitive spans
// WHY: Turn-level tests need deterministic replies whose redactions are known in advance

/// Contact card reply with an email and a phone number
pub const CONTACT_REPLY: &str = "Sure, here are the details you asked for. \
You can reach Ann Lee by email at ann.lee@example.com during office hours. \
Her direct line is 555-0142 if anything is urgent.";

pub const CONTACT_REDACTED: &str = "Sure, here are the details you asked for. \
You can reach ||Ann Lee|| by email at ||ann.lee@example.com|| during office hours. \
Her direct line is ||555-0142|| if anything is urgent.";

/// Reply mixing prose with a fenced code block that repeats a sensitive value
pub const CODE_REPLY: &str = "Set the contact address to ann.lee@example.com in your config.\n\n\
```toml\nowner = \"ann.lee@example.com\"\n```\n\nThen restart the service.";

/// Reply with no sensitive content at all
pub const PLAIN_REPLY: &str = "Rust ownership means each value has a single owner. \
When the owner goes out of scope the value is dropped. Borrowing lets code use a value without taking it.";
