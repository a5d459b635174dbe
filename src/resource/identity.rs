use std::fmt;

/// 调用方身份
///
/// 核心逻辑只把它当作键使用：登录用户是账号 ID，未登录请求共享匿名身份。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Identity {
    #[default]
    Anonymous,
    Account(i64),
}

impl Identity {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Identity::Account(_))
    }

    pub fn account_id(&self) -> Option<i64> {
        match self {
            Identity::Account(id) => Some(*id),
            Identity::Anonymous => None,
        }
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Identity::Anonymous => write!(f, "anonymous"),
            Identity::Account(id) => write!(f, "{}", id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_is_the_key_part() {
        assert_eq!(Identity::Account(7).to_string(), "7");
        assert_eq!(Identity::Anonymous.to_string(), "anonymous");
    }

    #[test]
    fn only_accounts_are_authenticated() {
        assert!(Identity::Account(1).is_authenticated());
        assert!(!Identity::default().is_authenticated());
        assert_eq!(Identity::Account(3).account_id(), Some(3));
        assert_eq!(Identity::Anonymous.account_id(), None);
    }
}
