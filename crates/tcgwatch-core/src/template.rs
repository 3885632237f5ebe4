//! 메시지 템플릿 치환.
//!
//! 템플릿 안의 `{name}` 중 허용된 이름만 치환한다. 허용된 이름인데 값이
//! 없으면 빈 문자열이 되고, 허용 목록에 없는 중괄호는 그대로 남는다.

use std::collections::HashMap;

/// 채팅 템플릿 자리표시자
pub const CHAT_PLACEHOLDERS: &[&str] = &[
    "message", "details", "metric", "value", "type", "impact", "actions", "mentions", "threshold",
    "trend", "measures",
];

/// 이메일 제목/본문 자리표시자
pub const EMAIL_PLACEHOLDERS: &[&str] = &[
    "type",
    "summary",
    "title",
    "date",
    "description",
    "details",
    "severity",
    "impact",
    "actions",
    "dashboardUrl",
];

/// 치환 값 모음
#[derive(Debug, Clone, Default)]
pub struct TemplateValues {
    values: HashMap<&'static str, String>,
}

impl TemplateValues {
    pub fn new() -> Self {
        Self::default()
    }

    /// 값 설정 (같은 이름이면 덮어씀)
    pub fn set(&mut self, name: &'static str, value: impl Into<String>) -> &mut Self {
        self.values.insert(name, value.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }
}

/// `template`의 허용된 자리표시자를 모두 치환한다.
pub fn render(template: &str, allowed: &[&str], values: &TemplateValues) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        match after.find('}') {
            Some(close) => {
                let name = &after[..close];
                // 짝 없는 '{'는 글자로 두고 안쪽 '{'부터 다시 읽는다
                if let Some(inner) = name.rfind('{') {
                    out.push('{');
                    out.push_str(&name[..inner]);
                    rest = &after[inner..];
                    continue;
                }
                if allowed.iter().any(|a| *a == name) {
                    out.push_str(values.get(name).unwrap_or(""));
                } else {
                    out.push('{');
                    out.push_str(name);
                    out.push('}');
                }
                rest = &after[close + 1..];
            }
            None => {
                out.push_str(&rest[open..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}
