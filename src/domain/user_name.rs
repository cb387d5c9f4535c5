use unicode_segmentation::UnicodeSegmentation;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserName(String);

impl UserName {
    /// Returns an instance of `UserName` if the input satisfies all
    /// our validation constraints on display names.
    pub fn parse(s: String) -> Result<UserName, String> {
        let trimmed = s.trim();
        let is_empty_or_whitespace = trimmed.is_empty();

        // A grapheme is a "user-perceived" character: `å` is a single
        // grapheme but it is composed of two characters.
        let is_too_long = trimmed.graphemes(true).count() > 256;

        let forbidden_characters = ['/', '(', ')', '"', '<', '>', '\\', '{', '}'];
        let contains_forbidden_characters =
            trimmed.chars().any(|g| forbidden_characters.contains(&g));

        if is_empty_or_whitespace || is_too_long || contains_forbidden_characters {
            Err(format!("{} is not a valid user name.", s))
        } else {
            Ok(Self(trimmed.to_owned()))
        }
    }
}

impl AsRef<str> for UserName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
