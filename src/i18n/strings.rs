/// Localized strings shown by the language switch control itself.
///
/// These are the few strings the engine needs before (or without) any bundle
/// being loaded, so they ship with the binary instead of the JSON bundles.
#[derive(Debug, Clone)]
pub struct LanguageStrings {
    /// Label shown on the switch control while a bundle is loading
    pub loading_label: &'static str,

    /// Transient notice shown when a switch could not be completed
    pub switch_failed_notice: &'static str,

    /// Banner text suggesting machine translation of the article body
    pub translate_banner: &'static str,

    /// Label of the banner's dismiss button
    pub translate_banner_dismiss: &'static str,
}

pub const JAPANESE_STRINGS: LanguageStrings = LanguageStrings {
    loading_label: "読み込み中…",
    switch_failed_notice: "言語を切り替えられませんでした。しばらくしてから再度お試しください。",
    translate_banner: "記事本文はブラウザの翻訳機能で翻訳できます。",
    translate_banner_dismiss: "閉じる",
};

pub const ENGLISH_STRINGS: LanguageStrings = LanguageStrings {
    loading_label: "Loading…",
    switch_failed_notice: "Could not switch language. Please try again later.",
    translate_banner: "Use your browser's translate feature to read the full article in English.",
    translate_banner_dismiss: "Dismiss",
};

pub const CHINESE_SIMPLIFIED_STRINGS: LanguageStrings = LanguageStrings {
    loading_label: "加载中…",
    switch_failed_notice: "无法切换语言，请稍后重试。",
    translate_banner: "可以使用浏览器的翻译功能阅读完整的中文文章。",
    translate_banner_dismiss: "关闭",
};

pub const KOREAN_STRINGS: LanguageStrings = LanguageStrings {
    loading_label: "불러오는 중…",
    switch_failed_notice: "언어를 전환할 수 없습니다. 잠시 후 다시 시도해 주세요.",
    translate_banner: "브라우저 번역 기능으로 기사 전문을 한국어로 읽을 수 있습니다.",
    translate_banner_dismiss: "닫기",
};

pub const SPANISH_STRINGS: LanguageStrings = LanguageStrings {
    loading_label: "Cargando…",
    switch_failed_notice: "No se pudo cambiar el idioma. Inténtalo de nuevo más tarde.",
    translate_banner: "Usa el traductor de tu navegador para leer el artículo completo en español.",
    translate_banner_dismiss: "Cerrar",
};
