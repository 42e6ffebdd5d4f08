//! URL片段（#之后）参数解析工具
//! 片段不是标准查询语法：按 `&` 切分，再按第一个 `=` 切分键值
//! `key` 与 `key=` 视为等价（值为空）

/// 片段参数列表（保持原顺序）
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FragmentParams {
    pairs: Vec<(String, Option<String>)>,
}

impl FragmentParams {
    /// 解析片段文本（不含 `#`），空键直接丢弃
    pub fn parse(fragment: &str) -> Self {
        let pairs = fragment
            .split('&')
            .filter_map(|token| {
                let (key, value) = match token.split_once('=') {
                    Some((key, value)) => (key, Some(value)),
                    None => (token, None),
                };
                if key.is_empty() {
                    return None;
                }
                let value = value.filter(|v| !v.is_empty()).map(str::to_string);
                Some((key.to_string(), value))
            })
            .collect();

        Self { pairs }
    }

    /// 仅保留满足条件的键
    pub fn retain_keys<F>(&mut self, mut keep: F) -> usize
    where
        F: FnMut(&str) -> bool,
    {
        let before = self.pairs.len();
        self.pairs.retain(|(key, _)| keep(key));
        before - self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn pairs(&self) -> &[(String, Option<String>)] {
        &self.pairs
    }
}

impl std::fmt::Display for FragmentParams {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (index, (key, value)) in self.pairs.iter().enumerate() {
            if index > 0 {
                f.write_str("&")?;
            }
            match value {
                Some(value) => write!(f, "{}={}", key, value)?,
                None => f.write_str(key)?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_key_and_empty_value_are_equivalent() {
        assert_eq!(FragmentParams::parse("key"), FragmentParams::parse("key="));
        assert_eq!(FragmentParams::parse("key=").to_string(), "key");
    }

    #[test]
    fn test_splits_on_first_equals_only() {
        let params = FragmentParams::parse("a=b=c&d");
        assert_eq!(
            params.pairs(),
            &[("a".to_string(), Some("b=c".to_string())), ("d".to_string(), None)]
        );
        assert_eq!(params.to_string(), "a=b=c&d");
    }

    #[test]
    fn test_empty_keys_are_dropped() {
        let params = FragmentParams::parse("&=x&&keep=1&");
        assert_eq!(params.to_string(), "keep=1");
    }

    #[test]
    fn test_retain_keys_reports_removed_count() {
        let mut params = FragmentParams::parse("utm_campaign=x&other=stay&utm_term");
        let removed = params.retain_keys(|key| !key.starts_with("utm_"));
        assert_eq!(removed, 2);
        assert_eq!(params.to_string(), "other=stay");

        let mut all_gone = FragmentParams::parse("utm_a");
        all_gone.retain_keys(|_| false);
        assert!(all_gone.is_empty());
        assert_eq!(all_gone.to_string(), "");
    }
}
