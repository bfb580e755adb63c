//! Render tree behaviour against a rendered editor page

use std::sync::Arc;

use docport_surface::{inner_html, Display, Element, RenderTree, TextAlign};

const EDITOR_PAGE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <style>
    .bn-block-content[data-text-alignment="center"] { text-align: center; }
    .bn-block-content[data-text-alignment="right"] { text-align: right; }
    .bn-side-menu { display: none }
    img.bn-visual-media { width: 320px }
  </style>
</head>
<body>
  <div id="root">
    <div class="bn-container" data-mantine-color-scheme="light">
      <div class="bn-editor" contenteditable="true" role="textbox">
        <div class="bn-block-outer" data-id="1">
          <div class="bn-block-content" data-content-type="heading" data-level="1">
            <h1 class="bn-inline-content">Quarterly report</h1>
          </div>
        </div>
        <div class="bn-block-outer" data-id="2">
          <div class="bn-block-content" data-content-type="paragraph" data-text-alignment="center">
            <p class="bn-inline-content">Centered &amp; bold <strong>text</strong></p>
          </div>
        </div>
        <div class="bn-block-outer" data-id="3">
          <div class="bn-block-content" data-content-type="image">
            <img class="bn-visual-media" src="chart.png" alt="chart">
          </div>
        </div>
        <div class="bn-side-menu"><button>+</button></div>
      </div>
    </div>
  </div>
</body>
</html>"#;

fn load() -> RenderTree {
    RenderTree::from_page(EDITOR_PAGE, Some("root")).expect("page loads")
}

#[test]
fn test_surface_text_skips_hidden_chrome() {
    let tree = load();
    assert_eq!(tree.inner_text(), "Quarterly report\n\nCentered & bold text");
}

#[test]
fn test_attached_clone_sees_host_rules() {
    let tree = load();
    let clone = tree.surface().unwrap().clone();
    let guard = tree.attach(clone);

    let mut aligned = Vec::new();
    let mut hidden = 0;
    let styles = guard.computed_styles();
    let mut index = 0;
    guard.root().for_each_descendant(&mut |el: &Element| {
        index += 1;
        let style = styles[index];
        if style.text_align == TextAlign::Center && el.is("p") {
            aligned.push(el.text_content());
        }
        if style.display == Display::None {
            hidden += 1;
        }
        if el.is("img") {
            assert_eq!(style.width_px, Some(320.0));
        }
    });

    assert_eq!(aligned, vec!["Centered & bold text".to_string()]);
    // The side menu itself is hidden; its button inherits nothing
    assert_eq!(hidden, 1);
}

#[test]
fn test_clone_serializes_without_touching_surface() {
    let tree = load();
    let mut guard = tree.attach(tree.surface().unwrap().clone());
    guard.root_mut().set_attr("data-exported", "yes");
    let markup = inner_html(guard.root());
    assert!(markup.contains("Quarterly report"));
    drop(guard);

    assert!(!tree.surface().unwrap().has_attr("data-exported"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_attachments_return_to_baseline() {
    let tree = Arc::new(load());
    let baseline = tree.body_child_count();

    let mut handles = Vec::new();
    for _ in 0..8 {
        let tree = Arc::clone(&tree);
        handles.push(tokio::spawn(async move {
            let guard = tree.attach(tree.surface().unwrap().clone());
            assert!(tree.body_child_count() > baseline);
            tokio::task::yield_now().await;
            guard.computed_styles().len()
        }));
    }
    for handle in handles {
        assert!(handle.await.unwrap() > 10);
    }

    assert_eq!(tree.body_child_count(), baseline);
    assert_eq!(tree.attached_count(), 0);
}
