//! Localisation capability.
//!
//! Templates use `{name}` placeholders, filled from the `args` slice passed to
//! [`Translator::translate`].

use std::collections::HashMap;

/// Locale used when the sender's language is unknown or has no bundle.
pub const FALLBACK_LOCALE: &str = "en";

/// Message keys used by the framework itself.
pub mod keys {
    pub const MISSING_ROUTE_ERROR: &str = "system.callback_query.missing_route.error";
    pub const MISSING_ROUTE_SOLUTION: &str = "system.callback_query.missing_route.solution";
    pub const MISSING_ACTION_DATA_ERROR: &str = "system.callback_query.missing_action_data.error";
    pub const MISSING_ACTION_DATA_SOLUTION: &str =
        "system.callback_query.missing_action_data.solution";
    pub const INVALID_ACTION_DATA_TRY_AGAIN: &str =
        "system.callback_query.invalid_action_data.try_again";
    pub const BASIC_GROUP_NAME: &str = "system.commands.groups.basic.name";
    pub const OTHER_GROUP_NAME: &str = "system.commands.groups.other.name";
    pub const START_HELP: &str = "system.commands.start.help";
    pub const HELP_HELP: &str = "system.commands.help.help";
    pub const HELP_MESSAGE: &str = "system.commands.help.message";
    pub const CANCEL_HELP: &str = "system.commands.cancel.help";
    pub const CANCEL_ALREADY_CANCELLED_ALL: &str = "system.commands.cancel.already_cancelled_all";
}

/// Looks up localised text.
pub trait Translator: Send + Sync {
    fn translate(&self, locale: &str, key: &str, args: &[(&str, &str)]) -> String;
}

const EN: &[(&str, &str)] = &[
    (
        keys::MISSING_ROUTE_ERROR,
        "Unable to dispatch Callback Query due to missing route DETECTED.",
    ),
    (
        keys::MISSING_ROUTE_SOLUTION,
        "For most of the time, this happens when the corresponding handler wasn't registered properly through on_callback_query(...) or the dispatcher failed to match it, please check registered handlers and their routes and then try again.",
    ),
    (
        keys::MISSING_ACTION_DATA_ERROR,
        "Unable to dispatch Callback Query due to missing action data DETECTED.",
    ),
    (
        keys::MISSING_ACTION_DATA_SOLUTION,
        "For most of the time, this happens when the action data stored for the callback query is either empty, expired, or failed to fetch from the store, please flush the corresponding keys and try again.",
    ),
    (
        keys::INVALID_ACTION_DATA_TRY_AGAIN,
        "Sorry, this operation cannot be performed as it is invalid. Please initiate another session of operation and try again.",
    ),
    (keys::BASIC_GROUP_NAME, "Basic Commands"),
    (keys::OTHER_GROUP_NAME, "Other Commands"),
    (keys::START_HELP, "Begin interacting with the bot"),
    (keys::HELP_HELP, "Display help information"),
    (
        keys::HELP_MESSAGE,
        "Here are the available commands:\n\n{commands}",
    ),
    (keys::CANCEL_HELP, "Cancel any ongoing operations."),
    (
        keys::CANCEL_ALREADY_CANCELLED_ALL,
        "No ongoing operations to cancel",
    ),
];

const ZH_CN: &[(&str, &str)] = &[
    (
        keys::MISSING_ROUTE_ERROR,
        "无法调度 Callback Query，检测到缺少路由。",
    ),
    (
        keys::MISSING_ROUTE_SOLUTION,
        "大多数情况下，发生这种情况的原因是相应的处理程序没有通过 on_callback_query(...) 正确注册，或者派发器未能与之匹配，请检查已注册的处理程序及其路由，然后再试一次。",
    ),
    (
        keys::MISSING_ACTION_DATA_ERROR,
        "无法调度 Callback Query，检测到缺少操作数据。",
    ),
    (
        keys::MISSING_ACTION_DATA_SOLUTION,
        "大多数情况下，当回调查询的操作数据为空、已过期或无法从存储中获取时会出现这种情况，请尝试清理相应的键并重试。",
    ),
    (
        keys::INVALID_ACTION_DATA_TRY_AGAIN,
        "抱歉，因为操作无效，此操作无法进行，请重新发起操作后再试。",
    ),
    (keys::BASIC_GROUP_NAME, "基础命令"),
    (keys::OTHER_GROUP_NAME, "其他命令"),
    (keys::START_HELP, "开始与 Bot 的交互"),
    (keys::HELP_HELP, "获取帮助"),
    (keys::HELP_MESSAGE, "当前支持这些命令：\n\n{commands}"),
    (keys::CANCEL_HELP, "取消当前操作"),
    (keys::CANCEL_ALREADY_CANCELLED_ALL, "已经没有正在进行的操作了"),
];

/// An in-memory translator backed by locale bundles.
///
/// Comes with `en` and `zh-CN` bundles for the framework's own keys.
#[derive(Debug, Clone)]
pub struct StaticTranslator {
    bundles: HashMap<String, HashMap<String, String>>,
    fallback: String,
}

impl Default for StaticTranslator {
    fn default() -> Self {
        Self::new()
    }
}

impl StaticTranslator {
    pub fn new() -> Self {
        Self::empty()
            .with_bundle(FALLBACK_LOCALE, EN.iter().copied())
            .with_bundle("zh-CN", ZH_CN.iter().copied())
    }

    /// A translator without any bundles.
    pub fn empty() -> Self {
        Self {
            bundles: HashMap::new(),
            fallback: FALLBACK_LOCALE.to_string(),
        }
    }

    /// Sets the locale consulted when the requested one has no entry.
    pub fn fallback_locale(mut self, locale: impl Into<String>) -> Self {
        self.fallback = locale.into();
        self
    }

    /// Adds entries to a locale, overriding existing keys.
    pub fn with_bundle<I, K, V>(mut self, locale: &str, entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let bundle = self.bundles.entry(normalize_locale(locale)).or_default();
        bundle.extend(entries.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    fn lookup(&self, locale: &str, key: &str) -> Option<&str> {
        let locale = normalize_locale(locale);
        // "zh-cn" -> "zh-cn", then "zh", then the fallback
        let language = locale.split('-').next().unwrap_or_default();

        [locale.as_str(), language, self.fallback.as_str()]
            .into_iter()
            .find_map(|candidate| self.bundles.get(&normalize_locale(candidate))?.get(key))
            .map(String::as_str)
    }
}

impl Translator for StaticTranslator {
    fn translate(&self, locale: &str, key: &str, args: &[(&str, &str)]) -> String {
        match self.lookup(locale, key) {
            Some(template) => render(template, args),
            None => key.to_string(),
        }
    }
}

fn normalize_locale(locale: &str) -> String {
    locale.trim().replace('_', "-").to_lowercase()
}

fn render(template: &str, args: &[(&str, &str)]) -> String {
    args.iter().fold(template.to_string(), |text, (name, value)| {
        text.replace(&format!("{{{name}}}"), value)
    })
}
