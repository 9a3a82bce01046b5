//! 语言代码注册表
//!
//! 静态的双向映射：语言名称/别名（繁体中文、简体中文、英文、ISO 639-2/3、
//! 国家简写）与规范语言代码之间的转换。其余所有组件都通过这里识别语言。

use std::collections::HashMap;

use once_cell::sync::Lazy;

/// 检测失败时使用的语言代码
pub const UNKNOWN_LANGUAGE: &str = "unknown";

/// 单个受支持语言的描述
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LanguageInfo {
    /// 规范代码（ISO 639-1，中文变体带地区后缀）
    pub code: &'static str,
    /// 英文显示名称，用于回复中的标注
    pub english_name: &'static str,
    /// 繁体中文显示名称
    pub chinese_name: &'static str,
}

const fn lang(code: &'static str, english_name: &'static str, chinese_name: &'static str) -> LanguageInfo {
    LanguageInfo {
        code,
        english_name,
        chinese_name,
    }
}

static LANGUAGES: &[LanguageInfo] = &[
    lang("zh", "Chinese", "中文"),
    lang("zh-TW", "Traditional Chinese", "繁體中文"),
    lang("zh-CN", "Simplified Chinese", "簡體中文"),
    lang("en", "English", "英文"),
    lang("ja", "Japanese", "日文"),
    lang("ko", "Korean", "韓文"),
    lang("fr", "French", "法文"),
    lang("de", "German", "德文"),
    lang("es", "Spanish", "西班牙文"),
    lang("pt", "Portuguese", "葡萄牙文"),
    lang("it", "Italian", "義大利文"),
    lang("ru", "Russian", "俄文"),
    lang("ar", "Arabic", "阿拉伯文"),
    lang("th", "Thai", "泰文"),
    lang("vi", "Vietnamese", "越南文"),
    lang("id", "Indonesian", "印尼文"),
    lang("ms", "Malay", "馬來文"),
    lang("nl", "Dutch", "荷蘭文"),
    lang("el", "Greek", "希臘文"),
    lang("pl", "Polish", "波蘭文"),
    lang("tr", "Turkish", "土耳其文"),
    lang("cs", "Czech", "捷克文"),
    lang("sv", "Swedish", "瑞典文"),
    lang("da", "Danish", "丹麥文"),
    lang("fi", "Finnish", "芬蘭文"),
    lang("hi", "Hindi", "印地文"),
    lang("uk", "Ukrainian", "烏克蘭文"),
    lang("he", "Hebrew", "希伯來文"),
    lang("hu", "Hungarian", "匈牙利文"),
    lang("nb", "Norwegian", "挪威文"),
    lang("tl", "Tagalog", "他加祿文"),
];

static ALIASES: &[(&str, &[&str])] = &[
    ("zh", &["中文", "華語", "华语", "漢語", "汉语", "國語", "国语", "chinese", "zho", "chi", "cmn"]),
    (
        "zh-TW",
        &[
            "繁體中文", "繁体中文", "正體中文", "繁中", "繁體", "繁体", "traditional chinese",
            "zh-hant", "zh-hk", "tw", "hk", "mo",
        ],
    ),
    (
        "zh-CN",
        &[
            "簡體中文", "简体中文", "簡中", "简中", "簡體", "简体", "simplified chinese",
            "zh-hans", "zh-sg", "cn", "sg",
        ],
    ),
    ("en", &["英文", "英語", "英语", "english", "eng", "us", "usa", "gb"]),
    ("ja", &["日文", "日語", "日语", "日本語", "日本语", "japanese", "jpn", "jp", "jap", "japan"]),
    ("ko", &["韓文", "韓語", "韩文", "韩语", "韓國語", "韩国语", "korean", "kor", "kr"]),
    ("fr", &["法文", "法語", "法语", "french", "fra", "fre"]),
    ("de", &["德文", "德語", "德语", "german", "deu", "ger"]),
    ("es", &["西班牙文", "西班牙語", "西班牙语", "spanish", "spa"]),
    ("pt", &["葡萄牙文", "葡萄牙語", "葡萄牙语", "portuguese", "por", "br"]),
    ("it", &["義大利文", "義大利語", "意大利文", "意大利語", "意大利语", "italian", "ita"]),
    ("ru", &["俄文", "俄語", "俄语", "russian", "rus"]),
    ("ar", &["阿拉伯文", "阿拉伯語", "阿拉伯语", "arabic", "ara"]),
    ("th", &["泰文", "泰語", "泰语", "thai", "tha"]),
    ("vi", &["越南文", "越南語", "越南语", "vietnamese", "vie", "vn"]),
    ("id", &["印尼文", "印尼語", "印尼语", "indonesian", "ind"]),
    ("ms", &["馬來文", "馬來語", "马来文", "马来语", "malay", "msa", "may"]),
    ("nl", &["荷蘭文", "荷蘭語", "荷兰文", "荷兰语", "dutch", "nld", "dut"]),
    ("el", &["希臘文", "希臘語", "希腊文", "希腊语", "greek", "ell", "gre"]),
    ("pl", &["波蘭文", "波蘭語", "波兰文", "波兰语", "polish", "pol"]),
    ("tr", &["土耳其文", "土耳其語", "土耳其语", "turkish", "tur"]),
    ("cs", &["捷克文", "捷克語", "捷克语", "czech", "ces", "cze"]),
    ("sv", &["瑞典文", "瑞典語", "瑞典语", "swedish", "swe"]),
    ("da", &["丹麥文", "丹麥語", "丹麦文", "丹麦语", "danish", "dan"]),
    ("fi", &["芬蘭文", "芬蘭語", "芬兰文", "芬兰语", "finnish", "fin"]),
    ("hi", &["印地文", "印地語", "印地语", "hindi", "hin"]),
    ("uk", &["烏克蘭文", "烏克蘭語", "乌克兰文", "乌克兰语", "ukrainian", "ukr", "ua"]),
    ("he", &["希伯來文", "希伯來語", "希伯来文", "希伯来语", "hebrew", "heb", "iw", "il"]),
    ("hu", &["匈牙利文", "匈牙利語", "匈牙利语", "hungarian", "hun"]),
    ("nb", &["挪威文", "挪威語", "挪威语", "norwegian", "nob", "nor", "no"]),
    (
        "tl",
        &["他加祿文", "他加祿語", "菲律賓文", "菲律賓語", "菲律宾语", "tagalog", "filipino", "tgl", "fil", "ph"],
    ),
];

/// 小写代码 -> 语言描述
static CODE_INDEX: Lazy<HashMap<String, &'static LanguageInfo>> = Lazy::new(|| {
    LANGUAGES
        .iter()
        .map(|info| (info.code.to_lowercase(), info))
        .collect()
});

/// 小写别名 -> 规范代码
static ALIAS_INDEX: Lazy<HashMap<String, &'static str>> = Lazy::new(|| {
    let mut index = HashMap::new();
    for (code, aliases) in ALIASES {
        for alias in aliases.iter() {
            index.insert(alias.to_lowercase(), *code);
        }
    }
    index
});

/// 所有可作为前缀匹配的键（代码与别名），按字节长度降序
static PREFIX_KEYS: Lazy<Vec<(String, &'static str)>> = Lazy::new(|| {
    let mut keys: Vec<(String, &'static str)> = CODE_INDEX
        .iter()
        .map(|(key, info)| (key.clone(), info.code))
        .chain(ALIAS_INDEX.iter().map(|(key, code)| (key.clone(), *code)))
        .collect();
    keys.sort_by(|a, b| b.0.len().cmp(&a.0.len()).then_with(|| a.0.cmp(&b.0)));
    keys
});

/// 将语言名称或代码转换为规范代码
///
/// 空输入返回 `unknown`；代码优先于别名匹配；无法识别时原样返回（已去除首尾空白）。
pub fn to_language_code(name_or_code: &str) -> String {
    let trimmed = name_or_code.trim();
    if trimmed.is_empty() {
        return UNKNOWN_LANGUAGE.to_string();
    }

    lookup(trimmed)
        .map(str::to_string)
        .unwrap_or_else(|| trimmed.to_string())
}

/// 语言名称或代码是否可被识别
pub fn is_supported(name_or_code: &str) -> bool {
    lookup(name_or_code.trim()).is_some()
}

fn lookup(key: &str) -> Option<&'static str> {
    let lower = key.to_lowercase();
    CODE_INDEX
        .get(&lower)
        .map(|info| info.code)
        .or_else(|| ALIAS_INDEX.get(&lower).copied())
}

/// 按代码查找语言描述（大小写不敏感）
pub fn language_info(code: &str) -> Option<&'static LanguageInfo> {
    CODE_INDEX.get(&code.trim().to_lowercase()).copied()
}

/// 英文显示名称；未知代码原样返回
pub fn english_name(code: &str) -> String {
    if code == UNKNOWN_LANGUAGE {
        return "Unknown".to_string();
    }
    language_info(code)
        .map(|info| info.english_name.to_string())
        .unwrap_or_else(|| code.to_string())
}

/// 繁体中文显示名称；未知代码原样返回
pub fn chinese_name(code: &str) -> String {
    if code == UNKNOWN_LANGUAGE {
        return "未知".to_string();
    }
    language_info(code)
        .map(|info| info.chinese_name.to_string())
        .unwrap_or_else(|| code.to_string())
}

/// 是否属于中文语系（zh、zh-TW、zh-CN ...）
pub fn is_chinese_family(code: &str) -> bool {
    code.trim().to_lowercase().starts_with("zh")
}

/// 两个代码是否属于同一语系
///
/// 中文变体视为同一个桶；其他语言比较主子标签。`unknown` 与任何语言都不同族。
pub fn same_family(a: &str, b: &str) -> bool {
    if a == UNKNOWN_LANGUAGE || b == UNKNOWN_LANGUAGE {
        return false;
    }
    if is_chinese_family(a) || is_chinese_family(b) {
        return is_chinese_family(a) && is_chinese_family(b);
    }
    primary_subtag(a).eq_ignore_ascii_case(primary_subtag(b))
}

fn primary_subtag(code: &str) -> &str {
    let code = code.trim();
    code.split(['-', '_']).next().unwrap_or(code)
}

/// 所有受支持的语言
pub fn supported_languages() -> &'static [LanguageInfo] {
    LANGUAGES
}

/// 在文本开头寻找最长的语言名称或代码
///
/// 返回 `(规范代码, 匹配的字节长度)`。ASCII 键要求后面不紧跟字母或数字。
pub fn match_prefix(text: &str) -> Option<(&'static str, usize)> {
    PREFIX_KEYS.iter().find_map(|(key, code)| {
        let head = text.get(..key.len())?;
        if !head.eq_ignore_ascii_case(key) {
            return None;
        }
        if key.is_ascii() {
            let next = text[key.len()..].chars().next();
            if next.is_some_and(|c| c.is_ascii_alphanumeric() || c == '-') {
                return None;
            }
        }
        Some((*code, key.len()))
    })
}
