//! 翻译指令解析
//!
//! 识别嵌在自由文本中的结构化指令，按以下优先级检查：
//!
//! 1. 多行形式：内容行之后跟一行 `翻譯成<语言>`，该行语言之后的文字追加到原文
//! 2. 单行形式：`翻譯成<语言> <文本>`
//! 3. 快速翻译：`快速翻譯:<代码> <文本>`，代码必须是已知语言
//! 4. 其他：整段文本作为原文，自动检测语言
//!
//! 明确指定的语言名称如果无法识别会原样保留，交给目标语言解析器拒绝。

use once_cell::sync::Lazy;
use regex::Regex;

use crate::translation::config::constants::{INSTRUCTION_KEYWORDS, QUICK_TRANSLATE_PREFIXES};
use crate::translation::error::{TranslationError, TranslationResult};
use crate::translation::language::registry;

/// 指令形式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstructionForm {
    MultiLine,
    SingleLine,
    QuickTranslate,
    Plain,
}

/// 解析后的翻译指令
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedInstruction {
    /// 待翻译的原文，解析成功时不为空
    pub source_text: String,
    /// 明确指定的目标语言：已知语言为规范代码，否则为用户输入的原文
    pub explicit_target_language: Option<String>,
    pub is_quick_translate: bool,
    pub form: InstructionForm,
}

impl ParsedInstruction {
    fn plain(source_text: &str) -> Self {
        Self {
            source_text: source_text.to_string(),
            explicit_target_language: None,
            is_quick_translate: false,
            form: InstructionForm::Plain,
        }
    }
}

/// 快速翻译用法说明
pub const QUICK_TRANSLATE_USAGE: &str =
    "Usage: 快速翻譯:<language code> <text>\nExample: 快速翻譯:en 你好";

/// 解析用户输入
///
/// 失败时返回 [`TranslationError::ParseError`]，其内容就是发给用户的提示。
pub fn parse_instruction(text: &str) -> TranslationResult<ParsedInstruction> {
    let text = text.trim();
    if text.is_empty() {
        return Err(parse_error("Please enter the text to translate."));
    }

    if let Some(result) = parse_multi_line(text) {
        return result;
    }
    if let Some(result) = parse_single_line(text) {
        return result;
    }
    if let Some(result) = parse_quick_translate(text) {
        return result;
    }

    Ok(ParsedInstruction::plain(text))
}

fn parse_error(message: impl Into<String>) -> TranslationError {
    TranslationError::ParseError(message.into())
}

fn strip_keyword(line: &str) -> Option<&str> {
    INSTRUCTION_KEYWORDS
        .iter()
        .find_map(|keyword| line.strip_prefix(keyword))
}

fn parse_multi_line(text: &str) -> Option<TranslationResult<ParsedInstruction>> {
    let lines: Vec<&str> = text.lines().collect();
    let index = lines
        .iter()
        .enumerate()
        .skip(1)
        .find(|(_, line)| strip_keyword(line.trim_start()).is_some())
        .map(|(index, _)| index)?;

    let rest = strip_keyword(lines[index].trim_start())?.trim_start();
    let Some(token) = split_language_token(rest) else {
        return Some(Err(parse_error(format!(
            "Please specify a target language after \"{}\".",
            INSTRUCTION_KEYWORDS[0]
        ))));
    };

    // 指令行上语言之后的文字用空格接在前文之后，后续各行另起一行
    let before = lines[..index].join("\n");
    let mut source_text = before.trim().to_string();
    let after_token = token.remainder.trim();
    if !after_token.is_empty() {
        if !source_text.is_empty() {
            source_text.push(' ');
        }
        source_text.push_str(after_token);
    }
    let following = lines[index + 1..].join("\n");
    let following = following.trim();
    if !following.is_empty() {
        if !source_text.is_empty() {
            source_text.push('\n');
        }
        source_text.push_str(following);
    }

    if source_text.is_empty() {
        return Some(Err(parse_error(format!(
            "Please provide the text to translate into {}.",
            registry::english_name(&token.code)
        ))));
    }

    Some(Ok(ParsedInstruction {
        source_text,
        explicit_target_language: Some(token.code),
        is_quick_translate: false,
        form: InstructionForm::MultiLine,
    }))
}

fn parse_single_line(text: &str) -> Option<TranslationResult<ParsedInstruction>> {
    let rest = strip_keyword(text)?.trim_start();
    let Some(token) = split_language_token(rest) else {
        return Some(Err(parse_error(format!(
            "Please specify a target language after \"{}\".",
            INSTRUCTION_KEYWORDS[0]
        ))));
    };

    let payload = token.remainder.trim();
    if payload.is_empty() {
        return Some(Err(parse_error(format!(
            "Please enter the text to translate after \"{}{}\".",
            INSTRUCTION_KEYWORDS[0], token.raw
        ))));
    }

    Some(Ok(ParsedInstruction {
        source_text: payload.to_string(),
        explicit_target_language: Some(token.code),
        is_quick_translate: false,
        form: InstructionForm::SingleLine,
    }))
}

fn parse_quick_translate(text: &str) -> Option<TranslationResult<ParsedInstruction>> {
    let rest = QUICK_TRANSLATE_PREFIXES
        .iter()
        .find_map(|prefix| text.strip_prefix(prefix))?
        .trim_start();

    let Some((code, payload)) = rest.split_once(char::is_whitespace) else {
        return Some(Err(parse_error(QUICK_TRANSLATE_USAGE)));
    };
    let payload = payload.trim();
    if code.is_empty() || payload.is_empty() {
        return Some(Err(parse_error(QUICK_TRANSLATE_USAGE)));
    }

    if !registry::is_supported(code) {
        return Some(Err(parse_error(format!("Unsupported language code: {}", code))));
    }

    Some(Ok(ParsedInstruction {
        source_text: payload.to_string(),
        explicit_target_language: Some(registry::to_language_code(code)),
        is_quick_translate: true,
        form: InstructionForm::QuickTranslate,
    }))
}

/// 注册表之外的语言名称：一段汉字，或以字母开头的字母/连字符
static LANGUAGE_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:\p{Han}+|[A-Za-z][A-Za-z-]*)").unwrap());

struct LanguageToken<'a> {
    /// 规范代码；无法识别时为原文
    code: String,
    raw: &'a str,
    remainder: &'a str,
}

/// 取出开头的语言名称或代码
///
/// 优先匹配注册表中最长的名称；否则取一段连续的汉字或 ASCII 字母/连字符。
fn split_language_token(text: &str) -> Option<LanguageToken<'_>> {
    if let Some((code, len)) = registry::match_prefix(text) {
        return Some(LanguageToken {
            code: code.to_string(),
            raw: &text[..len],
            remainder: &text[len..],
        });
    }

    let raw = LANGUAGE_TOKEN.find(text)?.as_str();
    let len = raw.len();
    Some(LanguageToken {
        code: registry::to_language_code(raw),
        raw,
        remainder: &text[len..],
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(result: TranslationResult<ParsedInstruction>) -> String {
        match result {
            Err(TranslationError::ParseError(message)) => message,
            other => panic!("expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_single_line_form() {
        let parsed = parse_instruction("翻譯成日文 你好").unwrap();
        assert_eq!(parsed.source_text, "你好");
        assert_eq!(parsed.explicit_target_language.as_deref(), Some("ja"));
        assert!(!parsed.is_quick_translate);
        assert_eq!(parsed.form, InstructionForm::SingleLine);

        let parsed = parse_instruction("翻译成英文你好吗").unwrap();
        assert_eq!(parsed.source_text, "你好吗");
        assert_eq!(parsed.explicit_target_language.as_deref(), Some("en"));

        let parsed = parse_instruction("翻譯成Korean  good morning").unwrap();
        assert_eq!(parsed.explicit_target_language.as_deref(), Some("ko"));
        assert_eq!(parsed.source_text, "good morning");
    }

    #[test]
    fn test_single_line_missing_payload() {
        let msg = message(parse_instruction("翻譯成日文"));
        assert_eq!(msg, "Please enter the text to translate after \"翻譯成日文\".");
    }

    #[test]
    fn test_unknown_language_name_passes_through() {
        let parsed = parse_instruction("翻譯成克林貢語 hello").unwrap();
        assert_eq!(parsed.explicit_target_language.as_deref(), Some("克林貢語"));
        assert_eq!(parsed.source_text, "hello");

        let parsed = parse_instruction("翻譯成klingon hello").unwrap();
        assert_eq!(parsed.explicit_target_language.as_deref(), Some("klingon"));
    }

    #[test]
    fn test_multi_line_form() {
        let parsed = parse_instruction("今天天氣很好\n翻譯成英文").unwrap();
        assert_eq!(parsed.source_text, "今天天氣很好");
        assert_eq!(parsed.explicit_target_language.as_deref(), Some("en"));
        assert_eq!(parsed.form, InstructionForm::MultiLine);

        let parsed = parse_instruction("第一行\n第二行\n翻譯成日文 第三行").unwrap();
        assert_eq!(parsed.source_text, "第一行\n第二行 第三行");
        assert_eq!(parsed.explicit_target_language.as_deref(), Some("ja"));
    }

    #[test]
    fn test_multi_line_same_line_remainder_joins_with_space() {
        let parsed = parse_instruction("你好\n翻譯成日文 朋友").unwrap();
        assert_eq!(parsed.source_text, "你好 朋友");

        let parsed = parse_instruction("你好\n翻譯成日文 朋友\n再見").unwrap();
        assert_eq!(parsed.source_text, "你好 朋友\n再見");
    }

    #[test]
    fn test_language_token_pattern_compiles() {
        let token = split_language_token("克林貢語 hello").unwrap();
        assert_eq!(token.raw, "克林貢語");
        assert_eq!(token.remainder, " hello");
        assert!(split_language_token("123").is_none());
    }

    #[test]
    fn test_multi_line_takes_precedence() {
        // 第一行以关键字开头，但后面还有指令行
        let parsed = parse_instruction("翻譯成法文 bonjour\n翻譯成日文").unwrap();
        assert_eq!(parsed.form, InstructionForm::MultiLine);
        assert_eq!(parsed.explicit_target_language.as_deref(), Some("ja"));
        assert_eq!(parsed.source_text, "翻譯成法文 bonjour");
    }

    #[test]
    fn test_quick_translate() {
        let parsed = parse_instruction("快速翻譯:en 你好").unwrap();
        assert_eq!(parsed.source_text, "你好");
        assert_eq!(parsed.explicit_target_language.as_deref(), Some("en"));
        assert!(parsed.is_quick_translate);

        let parsed = parse_instruction("快速翻译：ZH-tw hello").unwrap();
        assert_eq!(parsed.explicit_target_language.as_deref(), Some("zh-TW"));
    }

    #[test]
    fn test_quick_translate_errors() {
        assert_eq!(
            message(parse_instruction("快速翻譯:xx 你好")),
            "Unsupported language code: xx"
        );
        assert_eq!(message(parse_instruction("快速翻譯:en")), QUICK_TRANSLATE_USAGE);
        assert_eq!(message(parse_instruction("快速翻譯:")), QUICK_TRANSLATE_USAGE);
    }

    #[test]
    fn test_plain_text() {
        let parsed = parse_instruction("  Hello world  ").unwrap();
        assert_eq!(parsed.source_text, "Hello world");
        assert_eq!(parsed.explicit_target_language, None);
        assert_eq!(parsed.form, InstructionForm::Plain);

        assert!(parse_instruction("   ").is_err());
    }
}
