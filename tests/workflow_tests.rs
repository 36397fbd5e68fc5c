//! Integration tests for photogen editing workflows
//!
//! These tests drive the editor the way a user session does: upload, crop,
//! enhance, undo, detect and delete, checking the record state after each
//! step.

use image::Rgba;
use photogen::{
    AspectRatio, CropSession, CropState, DataUrl, Editor, EditorConfig, EnhancementParams,
    Image, OutputFormat, Rect, RecordId, ScaleContext, Space,
};

/// Test helper to create an opaque gradient image
fn create_test_image(width: u32, height: u32) -> Image<Rgba<u8>> {
    Image::from_fn(width, height, |x, y| {
        Rgba([
            (x * 255 / width) as u8,
            (y * 255 / height) as u8,
            96,
            255,
        ])
    })
}

fn png_url(image: &Image<Rgba<u8>>) -> DataUrl {
    DataUrl::encode(image, OutputFormat::Png, 100).expect("PNG encoding should succeed")
}

fn editor_with_images(count: usize, size: u32) -> Editor {
    let mut editor = Editor::new(EditorConfig::default());
    let url = png_url(&create_test_image(size, size));
    for i in 0..count {
        editor
            .upload(&format!("photo{i}.png"), url.clone())
            .expect("Upload should succeed");
    }
    editor
}

#[test]
fn crop_then_enhance_then_undo_keeps_crop() {
    let mut editor = editor_with_images(1, 1000);

    // Commit 1: square crop at (100, 100, 400, 400) in source pixels
    editor.begin_crop((500.0, 500.0)).unwrap();
    editor
        .drag_crop(Rect::new(Space::Source, 100.0, 100.0, 400.0, 400.0))
        .unwrap();
    let geometry = editor.save_crop().unwrap();
    assert_eq!(
        (geometry.x, geometry.y, geometry.width, geometry.height),
        (100, 100, 400, 400)
    );

    // Commit 2: brightness 120
    editor
        .save_enhancements(EnhancementParams {
            brightness: 120.0,
            ..Default::default()
        })
        .unwrap();
    let enhanced = editor.current().unwrap().state.clone();
    assert_eq!(enhanced.enhancement_settings.brightness, 120.0);
    assert_eq!(enhanced.url.dimensions().unwrap(), (400, 400));

    editor.undo().unwrap();
    let record = editor.current().unwrap();
    assert_eq!(record.state.enhancement_settings.brightness, 100.0);
    assert_eq!(record.state.crop_data.as_ref(), Some(&geometry));
    assert_eq!(record.redo_history.len(), 1);

    editor.redo().unwrap();
    assert_eq!(editor.current().unwrap().state, enhanced);
}

#[test]
fn detection_box_maps_to_display_and_back() {
    let ctx = ScaleContext::new((2000, 3000), (400.0, 600.0));
    let mut session = CropSession::new(RecordId(1), ctx, &EditorConfig::default());
    session
        .set_aspect(AspectRatio::from_label("Passport").unwrap())
        .unwrap();

    let ticket = session.begin_detection().unwrap();
    assert_eq!(session.state(), CropState::AutoDetecting);
    assert!((ticket.aspect_ratio - 35.0 / 45.0).abs() < 1e-12);

    let detected = Rect::new(Space::Source, 500.0, 800.0, 700.0, 900.0);
    assert!(session.apply_detection(&ticket, detected).unwrap());
    assert_eq!(
        session.crop_box().unwrap(),
        Rect::new(Space::Display, 100.0, 160.0, 140.0, 180.0)
    );
    assert_eq!(session.crop_box_in(Space::Source).unwrap().unwrap(), detected);

    let geometry = session.save().unwrap();
    assert_eq!(geometry.to_rect(), detected);
    assert_eq!(geometry.aspect_ratio_label.as_deref(), Some("Passport"));
    assert_eq!(session.state(), CropState::Idle);
}

#[test]
fn deleting_current_image_selects_previous() {
    let mut editor = editor_with_images(3, 8);
    editor.select(1);
    let first = editor.collection().get(0).unwrap().id();

    editor.delete(1).unwrap();
    assert_eq!(editor.collection().len(), 2);
    assert_eq!(editor.current_index(), 0);
    assert_eq!(editor.current().unwrap().id(), first);
}

#[test]
fn deleting_earlier_image_keeps_selection() {
    let mut editor = editor_with_images(3, 8);
    let last = editor.current().unwrap().id();
    assert_eq!(editor.current_index(), 2);

    editor.delete(0).unwrap();
    assert_eq!(editor.current_index(), 1);
    assert_eq!(editor.current().unwrap().id(), last);
}

#[test]
fn enhancement_save_after_undo_discards_redo() {
    let mut editor = editor_with_images(1, 16);
    for brightness in [110.0, 120.0, 130.0] {
        editor
            .save_enhancements(EnhancementParams {
                brightness,
                ..Default::default()
            })
            .unwrap();
    }
    editor.undo().unwrap();
    editor.undo().unwrap();
    assert_eq!(editor.current().unwrap().redo_history.len(), 2);

    editor
        .save_enhancements(EnhancementParams {
            contrast: 80.0,
            ..Default::default()
        })
        .unwrap();
    let record = editor.current().unwrap();
    assert!(record.redo_history.is_empty());
    assert_eq!(record.edit_history.len(), 2);
    assert!(editor.redo().is_err());
}

#[test]
fn crop_session_follows_selection() {
    let mut editor = editor_with_images(2, 20);
    editor.begin_crop((20.0, 20.0)).unwrap();
    assert_eq!(
        editor.crop_session().unwrap().record_id(),
        editor.current().unwrap().id()
    );

    editor.select(0);
    assert!(editor.crop_session().is_none());

    // Reopening on the new record starts from a fresh, centred square box.
    let session = editor.begin_crop((20.0, 20.0)).unwrap();
    let rect = session.crop_box().unwrap();
    assert!((rect.width - 16.0).abs() < 1e-9 && (rect.height - 16.0).abs() < 1e-9);
    assert!((rect.x - 2.0).abs() < 1e-9 && (rect.y - 2.0).abs() < 1e-9);
}
