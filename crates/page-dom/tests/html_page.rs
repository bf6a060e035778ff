use palette_page_dom::{DomEffect, DomError, HighlightPulse, HtmlPage, PageDriver, PageQuery};

const STORE: &str = r#"<html>
<head><title>Shop</title></head>
<body>
  <nav>
    <a href="/cart" aria-label="Cart"><img src="cart.svg" alt="cart icon"></a>
    <a href="/orders">Orders</a>
  </nav>
  <form>
    <input name="q" placeholder="Search products">
    <button type="submit" title="Run search">Go</button>
  </form>
</body>
</html>"#;

#[test]
fn css_and_xpath_agree_on_handles() {
    let page = HtmlPage::parse("https://shop.example/catalog", STORE);
    let by_css = page.query_selector_all("nav a").unwrap();
    let by_xpath = page.evaluate_xpath("//nav/a").unwrap();
    assert_eq!(by_css, by_xpath);
    assert_eq!(by_css.len(), 2);
}

#[test]
fn element_text_exposes_label_sources() {
    let page = HtmlPage::parse("https://shop.example/catalog", STORE);

    let cart = page.query_selector_all("a[href='/cart']").unwrap()[0];
    let text = page.element_text(&cart).unwrap();
    assert_eq!(text.inner_text, "");
    assert_eq!(text.aria_label.as_deref(), Some("Cart"));

    let button = page.evaluate_xpath("//button[@type='submit']").unwrap()[0];
    let text = page.element_text(&button).unwrap();
    assert_eq!(text.inner_text, "Go");
    assert_eq!(text.title.as_deref(), Some("Run search"));
}

#[test]
fn invalid_xpath_reports_expression() {
    let page = HtmlPage::parse("https://shop.example/", STORE);
    match page.evaluate_xpath("//button[") {
        Err(DomError::InvalidXPath { expression, .. }) => assert_eq!(expression, "//button["),
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn detaching_a_subtree_hides_its_descendants() {
    let page = HtmlPage::parse("https://shop.example/", STORE);
    let form = page.query_selector_all("form").unwrap()[0];
    let input = page.query_selector_all("input").unwrap()[0];
    page.detach(&form);

    assert!(!page.is_connected(&input));
    assert!(page.evaluate_xpath("//input").unwrap().is_empty());
    assert!(page.query_selector_all("button").unwrap().is_empty());
    assert_eq!(page.query_selector_all("a").unwrap().len(), 2);
}

#[test]
fn highlight_records_pulse_timing() {
    let page = HtmlPage::parse("https://shop.example/", STORE);
    let orders = page.evaluate_xpath("//a[text()='Orders']").unwrap()[0];
    page.pulse_highlight(&orders, HighlightPulse::default())
        .unwrap();
    assert_eq!(
        page.effects(),
        vec![DomEffect::Highlight {
            node: orders.node,
            hold_ms: 1000,
            fade_ms: 1000,
        }]
    );
}
