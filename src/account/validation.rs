use crate::error::{AppError, AppResult};

const USERNAME_MIN_LEN: usize = 3;
const USERNAME_MAX_LEN: usize = 30;

/// 去除首尾空白并转小写，用于查询与唯一性比较
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// 基本邮箱格式检查：local@domain.tld
pub fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && domain.split('.').all(|part| !part.is_empty())
}

/// 用户名只允许字母、数字、点、下划线和连字符，长度3到30
pub fn is_valid_username(username: &str) -> bool {
    (USERNAME_MIN_LEN..=USERNAME_MAX_LEN).contains(&username.chars().count())
        && username
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '_' || c == '-')
}

pub fn require_email(email: &str) -> AppResult<String> {
    let normalized = normalize_email(email);
    if !is_valid_email(&normalized) {
        return Err(AppError::Validation("Invalid email address".into()));
    }
    Ok(normalized)
}

pub fn require_matching_passwords(password: &str, confirm: &str) -> AppResult<()> {
    if password != confirm {
        return Err(AppError::Validation("Passwords do not match".into()));
    }
    if password.is_empty() {
        return Err(AppError::Validation("Password must not be empty".into()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_format() {
        assert!(is_valid_email("user@example.com"));
        assert!(is_valid_email("first.last+tag@sub.example.co"));
        assert!(!is_valid_email("userexample.com"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email("user@example"));
        assert!(!is_valid_email("user@@example.com"));
        assert!(!is_valid_email("user@example..com"));
        assert!(!is_valid_email("us er@example.com"));
    }

    #[test]
    fn email_is_normalized() {
        assert_eq!(require_email("  User@Example.COM ").unwrap(), "user@example.com");
        assert!(matches!(require_email("nope"), Err(AppError::Validation(_))));
    }

    #[test]
    fn username_pattern() {
        assert!(is_valid_username("new_user"));
        assert!(is_valid_username("a.b-c"));
        assert!(!is_valid_username("ab"));
        assert!(!is_valid_username(&"x".repeat(31)));
        assert!(!is_valid_username("bad name"));
        assert!(!is_valid_username("名字名字"));
    }

    #[test]
    fn password_confirmation() {
        assert!(require_matching_passwords("secret", "secret").is_ok());
        assert!(matches!(
            require_matching_passwords("secret", "Secret"),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            require_matching_passwords("", ""),
            Err(AppError::Validation(_))
        ));
    }
}
