//! 常用的资源级权限谓词

use super::identity::Identity;

/// 调用方必须已登录
pub fn login_required(identity: &Identity) -> bool {
    identity.is_authenticated()
}

/// 不做限制
pub fn allow_any(_identity: &Identity) -> bool {
    true
}
