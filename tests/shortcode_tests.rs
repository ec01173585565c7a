#[cfg(test)]
mod tests {
    use genie_view::config::{EngineConfig, SiteUrls};
    use genie_view::engine::ViewEngine;
    use std::fs;
    use tempfile::TempDir;
    use test_log::test;

    fn write_template(dir: &TempDir, name: &str, content: &str) {
        fs::write(dir.path().join(name), content).unwrap();
    }

    fn engine_for(templates: &TempDir) -> ViewEngine {
        let config = EngineConfig::new()
            .template_folder(templates.path())
            .cache_dir(templates.path().join("twig_cache"))
            .site(SiteUrls {
                theme: "https://example.com/themes/genie/".to_string(),
                ajax: "https://example.com/admin-ajax.php".to_string(),
                home: "https://example.com/".to_string(),
            });
        ViewEngine::new(config).unwrap()
    }

    #[test]
    fn expands_view_shortcode_inline() {
        let templates = TempDir::new().unwrap();
        write_template(&templates, "hello.twig", "Hello {{ name }}!");
        let engine = engine_for(&templates);

        let html = engine.expand_shortcodes(
            "before [genie_view view=\"hello.twig\" name=\"World\"] after",
        );
        assert_eq!(html, "before Hello World! after");
    }

    #[test]
    fn view_reference_falls_back_to_positional_attribute() {
        let templates = TempDir::new().unwrap();
        write_template(&templates, "hello.twig", "Hello {{ name }}!");
        let engine = engine_for(&templates);

        let html = engine.expand_shortcodes("[genie_view hello.twig name=World]");
        assert_eq!(html, "Hello World!");
    }

    #[test]
    fn view_reference_falls_back_to_enclosed_body() {
        let templates = TempDir::new().unwrap();
        let engine = engine_for(&templates);

        let html = engine.expand_shortcodes("[genie_view]{{ 2 + 3 }}[/genie_view]");
        assert_eq!(html, "5");
    }

    #[test]
    fn view_attribute_wins_over_fallbacks() {
        let templates = TempDir::new().unwrap();
        write_template(&templates, "hello.twig", "Hello {{ name }}!");
        let engine = engine_for(&templates);

        let html = engine
            .expand_shortcodes("[genie_view ignored.twig view=\"hello.twig\" name=X]");
        assert_eq!(html, "Hello X!");
    }

    #[test]
    fn named_attributes_become_render_vars() {
        let templates = TempDir::new().unwrap();
        write_template(
            &templates,
            "hello.twig",
            "Hello {{ name }}{{ punct }} ({{ view }})",
        );
        let engine = engine_for(&templates);

        let html = engine
            .expand_shortcodes("[genie_view view=\"hello.twig\" name=World punct=\"!\"]");
        assert_eq!(html, "Hello World! (hello.twig)");
    }

    #[test]
    fn site_context_reaches_shortcode_renders() {
        let templates = TempDir::new().unwrap();
        write_template(&templates, "link.twig", "{{ _site.urls.home }}");
        let engine = engine_for(&templates);

        let html = engine.expand_shortcodes("[genie_view view=\"link.twig\"]");
        assert_eq!(html, "https://example.com/");
    }

    #[test]
    fn unknown_tags_pass_through() {
        let templates = TempDir::new().unwrap();
        let engine = engine_for(&templates);

        let content = "keep [gallery id=3] and [genie_view]{{ 1 }}[/genie_view]";
        assert_eq!(
            engine.expand_shortcodes(content),
            "keep [gallery id=3] and 1"
        );
    }

    #[test]
    fn double_brackets_escape_the_directive() {
        let templates = TempDir::new().unwrap();
        let engine = engine_for(&templates);

        let html = engine.expand_shortcodes("[[genie_view view=\"hello.twig\"]]");
        assert_eq!(html, "[genie_view view=\"hello.twig\"]");
    }

    #[test]
    fn rendered_templates_expand_shortcodes_by_default() {
        let templates = TempDir::new().unwrap();
        write_template(
            &templates,
            "wrapper.twig",
            "X [genie_view view=\"inner.twig\"] Y",
        );
        write_template(&templates, "inner.twig", "INNER");
        let engine = engine_for(&templates);

        assert_eq!(engine.view("wrapper.twig").render(), "X INNER Y");
    }

    #[test]
    fn disabled_shortcodes_stay_verbatim() {
        let templates = TempDir::new().unwrap();
        write_template(
            &templates,
            "wrapper.twig",
            "X [genie_view view=\"inner.twig\"] Y",
        );
        write_template(&templates, "inner.twig", "INNER");
        let engine = engine_for(&templates);

        let html = engine.view("wrapper.twig").disable_shortcodes().render();
        assert_eq!(html, "X [genie_view view=\"inner.twig\"] Y");
    }

    #[test]
    fn broken_view_degrades_to_message_text() {
        let templates = TempDir::new().unwrap();
        let engine = engine_for(&templates);

        let html = engine.expand_shortcodes("[genie_view view=\"nope.twig\"]");
        assert!(html.contains("not found"), "got: {html}");
    }

    #[test]
    fn hosts_can_register_their_own_tags() {
        let templates = TempDir::new().unwrap();
        let config = EngineConfig::new()
            .template_folder(templates.path())
            .cache_dir(templates.path().join("twig_cache"))
            .site(SiteUrls {
                theme: String::new(),
                ajax: String::new(),
                home: "https://example.com/".to_string(),
            })
            .shortcode("home_url", |engine: &ViewEngine, _attrs, _body| {
                engine.view("{{ _site.urls.home }}").render()
            });
        let engine = ViewEngine::new(config).unwrap();

        assert_eq!(
            engine.expand_shortcodes("go to [home_url] now"),
            "go to https://example.com/ now"
        );
    }

    #[test]
    fn empty_directive_renders_nothing() {
        let templates = TempDir::new().unwrap();
        let engine = engine_for(&templates);

        assert_eq!(engine.expand_shortcodes("a [genie_view] b"), "a  b");
    }
}
