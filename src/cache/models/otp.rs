/// 邮箱验证码，键为邮箱，值为6位数字
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OtpEntry {
    pub email: String,
    pub code: String,
    pub ttl_secs: u64,
}
