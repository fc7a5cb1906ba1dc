//! Очистка пользовательского текста перед сохранением

/// Убрать HTML-разметку из свободного текста (проблема, корректирующее действие, комментарии)
///
/// Результат хранится как обычный текст: сущности, которые ammonia
/// расставляет при сериализации, декодируются обратно.
pub fn sanitize_plain(text: &str) -> String {
    let cleaned = ammonia::Builder::new()
        .tags(maplit::hashset![])
        .clean(text)
        .to_string();
    unescape_entities(&cleaned).trim().to_string()
}

/// `&amp;` последним, иначе `&amp;lt;` превратится в `<`
fn unescape_entities(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&nbsp;", "\u{a0}")
        .replace("&quot;", "\"")
        .replace("&amp;", "&")
}

/// То же для необязательного поля; пустая строка превращается в `None`
pub fn sanitize_opt(text: Option<String>) -> Option<String> {
    text.map(|t| sanitize_plain(&t)).filter(|t| !t.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tags_are_stripped() {
        assert_eq!(
            sanitize_plain("<b>Supplier</b> delay<script>alert(1)</script>"),
            "Supplier delay"
        );
    }

    #[test]
    fn test_plain_text_is_kept() {
        assert_eq!(sanitize_plain(" R&D budget "), "R&D budget");
        assert_eq!(sanitize_plain("R&D cost < 5%"), "R&D cost < 5%");
    }

    #[test]
    fn test_entities_survive_tag_stripping() {
        assert_eq!(
            sanitize_plain("<b>R&D</b> cost < 5% & rising"),
            "R&D cost < 5% & rising"
        );
        assert_eq!(sanitize_plain("a &lt;b&gt; c"), "a <b> c");
    }

    #[test]
    fn test_blank_becomes_none() {
        assert_eq!(sanitize_opt(Some("  ".into())), None);
        assert_eq!(sanitize_opt(Some(" ok ".into())), Some("ok".into()));
        assert_eq!(sanitize_opt(None), None);
    }
}
