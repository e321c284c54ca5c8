//! 画像の読み書き・切り出し・描画を行うモジュール

use std::fs;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use image::{DynamicImage, Pixel, Rgb, RgbImage};
use imageproc::drawing::draw_filled_rect_mut;
use imageproc::drawing::{draw_text_mut, text_size};
use imageproc::rect::Rect;
use rusttype::{Font, Scale};

use crate::bbox::AbsoluteBox;
use crate::detection_result::Detection;
use crate::error::Error;

/// 画像を読み込みます。
///
/// # Args
/// * `path` - 画像ファイルのパス
///
/// # Return
/// * 読み込んだ画像。デコードに失敗した場合は `Error::ImageLoadFailure`
pub fn read_image<P: AsRef<Path>>(path: P) -> Result<DynamicImage, Error> {
    let path = path.as_ref();
    image::open(path).map_err(|e| Error::ImageLoadFailure {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

/// 画像を保存します。形式は拡張子から決まります。
pub fn write_image<P: AsRef<Path>>(path: P, img: &DynamicImage) -> Result<(), Error> {
    let path = path.as_ref();
    img.save(path).map_err(|e| Error::ImageWriteFailure {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

/// ボックスの範囲を切り出します。
///
/// 範囲は画像内にクリップします。
///
/// # Args
/// * `img` - 元画像
/// * `bbox` - 切り出す範囲 (画素座標)
///
/// # Return
/// * 切り出した画像。クリップ後の範囲が空の場合は None
pub fn crop(img: &DynamicImage, bbox: &AbsoluteBox) -> Option<DynamicImage> {
    let clip = |v: i32, max: u32| v.clamp(0, max as i32) as u32;
    let x1 = clip(bbox.x1, img.width());
    let y1 = clip(bbox.y1, img.height());
    let x2 = clip(bbox.x2, img.width());
    let y2 = clip(bbox.y2, img.height());

    if x2 <= x1 || y2 <= y1 {
        return None;
    }
    Some(img.crop_imm(x1, y1, x2 - x1, y2 - y1))
}

/// フォントファイルを読み込みます。
pub fn load_font<P: AsRef<Path>>(path: P) -> Result<Font<'static>> {
    let path = path.as_ref();
    let data = fs::read(path).with_context(|| format!("failed to read font {}", path.display()))?;
    Font::try_from_vec(data).ok_or_else(|| anyhow!("invalid font file: {}", path.display()))
}

const COLORS: [[u8; 3]; 10] = [
    [255, 0, 0],
    [255, 255, 0],
    [0, 0, 255],
    [14, 23, 50],
    [28, 105, 80],
    [190, 159, 53],
    [46, 194, 148],
    [242, 30, 131],
    [97, 101, 198],
    [115, 11, 87],
];

/// クラスIDに対応する描画色
pub fn class_color(class_id: u32) -> Rgb<u8> {
    *Rgb::from_slice(&COLORS[class_id as usize % COLORS.len()])
}

/// 画像上に水平・垂直な線を描画します。端点の順序は問いません。
///
/// # Args
///
/// * `img` - 線を描画する画像 (in-place)
/// * `(x1, y1)`, `(x2, y2)` - 線の端点
/// * `thickness` - 線の太さ
/// * `color` - 線の色
fn draw_line(
    img: &mut RgbImage,
    (x1, y1): (i64, i64),
    (x2, y2): (i64, i64),
    thickness: u32,
    color: Rgb<u8>,
) {
    let half = (thickness / 2) as i64;
    let (left, right) = (x1.min(x2), x1.max(x2));
    let (top, bottom) = (y1.min(y2), y1.max(y2));

    // 画像外の部分は描かない
    let x0 = (left - half).max(0);
    let y0 = (top - half).max(0);
    let x_end = (right - half + thickness as i64).min(img.width() as i64);
    let y_end = (bottom - half + thickness as i64).min(img.height() as i64);
    if x_end <= x0 || y_end <= y0 {
        return;
    }

    let rect = Rect::at(x0 as i32, y0 as i32).of_size((x_end - x0) as u32, (y_end - y0) as u32);
    draw_filled_rect_mut(img, rect, color);
}

/// 画像上に矩形の枠を描画します。
///
/// # Args
///
/// * `img` - 矩形を描画する画像 (in-place)
/// * `bbox` - 矩形の範囲
/// * `thickness` - 線の太さ (1以上)
/// * `color` - 線の色
pub fn draw_rect(img: &mut RgbImage, bbox: &AbsoluteBox, thickness: f32, color: Rgb<u8>) {
    let thickness = thickness.max(1.) as u32;
    let (x1, y1) = (bbox.x1 as i64, bbox.y1 as i64);
    let (x2, y2) = (bbox.x2 as i64, bbox.y2 as i64);

    draw_line(img, (x1, y1), (x1, y2), thickness, color);
    draw_line(img, (x1, y2), (x2, y2), thickness, color);
    draw_line(img, (x1, y1), (x2, y1), thickness, color);
    draw_line(img, (x2, y1), (x2, y2), thickness, color);
}

/// 画像上にラベルを描画します。ラベルはボックスの上辺の上に置き、画像からはみ出さないようにします。
///
/// # Args
///
/// * `img` - ラベルを描画する画像 (in-place)
/// * `x1`, `y1` - ボックスの左上の座標
/// * `bg_color` - ラベルの背景色
/// * `font` - ラベルのフォント
/// * `font_size` - ラベルのフォントサイズ
/// * `text` - ラベルに表示するテキスト
fn draw_label(
    img: &mut RgbImage,
    x1: f32,
    y1: f32,
    bg_color: Rgb<u8>,
    font: &Font,
    font_size: f32,
    text: &str,
) {
    let label_h = font_size;
    let label_x = x1.max(0.);
    let label_y = (y1 - label_h).max(0.);

    let pad = 6.;
    let scale = Scale::uniform(label_h);
    let (text_w, _) = text_size(scale, font, text);
    let v_metrics = font.v_metrics(scale);
    let text_h = v_metrics.ascent - v_metrics.descent + v_metrics.line_gap;

    let rect = Rect::at(label_x as i32, label_y as i32)
        .of_size((text_w as f32 + pad * 2.).max(1.) as u32, label_h.max(1.) as u32);
    draw_filled_rect_mut(img, rect, bg_color);

    let text_y = label_y + (label_h - text_h) / 2.;

    let text_color = if (bg_color[0] as i32 + bg_color[1] as i32 + bg_color[2] as i32) < 382 {
        Rgb([255u8, 255, 255])
    } else {
        Rgb([0u8, 0, 0])
    };
    draw_text_mut(
        img,
        text_color,
        (label_x + pad) as i32,
        text_y as i32,
        scale,
        font,
        text,
    );
}

/// 画像上に検出結果のバウンディングボックスとラベルを描画します。
///
/// # Args
///
/// * `img` - 描画する画像 (in-place)
/// * `detections` - 検出結果の配列
/// * `font` - ラベルのフォント。None の場合はボックスのみ描画します
/// * `font_size` - ラベルのフォントサイズ
/// * `line_thickness` - バウンディングボックスの線の太さ
pub fn draw_detections(
    img: &mut RgbImage,
    detections: &[Detection],
    font: Option<&Font>,
    font_size: f32,
    line_thickness: f32,
) {
    for d in detections {
        let color = class_color(d.class_id);
        draw_rect(img, &d.bbox, line_thickness, color);

        if let Some(font) = font {
            draw_label(
                img,
                d.bbox.x1 as f32,
                d.bbox.y1 as f32,
                color,
                font,
                font_size,
                &d.class_name,
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crop_clips_to_image() {
        let img = DynamicImage::ImageRgb8(RgbImage::new(100, 50));
        let c = crop(&img, &AbsoluteBox::new(-10, 10, 40, 80)).unwrap();
        assert_eq!((c.width(), c.height()), (40, 40));

        let c = crop(&img, &AbsoluteBox::new(90, 0, 120, 50)).unwrap();
        assert_eq!((c.width(), c.height()), (10, 50));
    }

    #[test]
    fn crop_outside_image_is_empty() {
        let img = DynamicImage::ImageRgb8(RgbImage::new(100, 50));
        assert!(crop(&img, &AbsoluteBox::new(150, 10, 200, 40)).is_none());
        assert!(crop(&img, &AbsoluteBox::new(10, 10, 10, 40)).is_none());
    }

    #[test]
    fn draw_rect_paints_border_only() {
        let mut img = RgbImage::new(50, 50);
        let color = class_color(0);
        draw_rect(&mut img, &AbsoluteBox::new(10, 10, 40, 40), 2., color);

        assert_eq!(*img.get_pixel(10, 25), color);
        assert_eq!(*img.get_pixel(25, 10), color);
        assert_eq!(*img.get_pixel(40, 25), color);
        assert_eq!(*img.get_pixel(25, 25), Rgb([0, 0, 0]));
    }

    #[test]
    fn draw_detections_without_font_draws_boxes() {
        let mut img = RgbImage::new(30, 30);
        let d = Detection {
            class_id: 2,
            bbox: AbsoluteBox::new(5, 5, 20, 20),
            class_name: "gloves".to_string(),
        };
        draw_detections(&mut img, &[d], None, 12., 1.);
        assert_eq!(*img.get_pixel(5, 10), class_color(2));
    }

    const FONT_PATH: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/assets/DejaVuSansMono.ttf");

    #[test]
    fn reversed_corners_draw_the_same_rect() {
        let color = class_color(1);
        let mut normal = RgbImage::new(50, 50);
        draw_rect(&mut normal, &AbsoluteBox::new(10, 12, 40, 35), 3., color);
        let mut reversed = RgbImage::new(50, 50);
        draw_rect(&mut reversed, &AbsoluteBox::new(40, 35, 10, 12), 3., color);

        assert_eq!(normal, reversed);
        assert_eq!(*reversed.get_pixel(10, 20), color);
        assert_eq!(*reversed.get_pixel(0, 20), Rgb([0, 0, 0]));
    }

    #[test]
    fn rect_larger_than_image_is_clipped() {
        let mut img = RgbImage::new(20, 20);
        let color = class_color(0);
        draw_rect(&mut img, &AbsoluteBox::new(i32::MIN, 5, i32::MAX, 15), 2., color);
        assert_eq!(*img.get_pixel(10, 5), color);
        assert_eq!(*img.get_pixel(10, 10), Rgb([0, 0, 0]));
    }

    #[test]
    fn label_is_kept_inside_the_image() {
        let font = load_font(FONT_PATH).unwrap();
        let color = class_color(0);
        let d = Detection {
            class_id: 0,
            bbox: AbsoluteBox::new(-30, 5, 60, 40),
            class_name: "person".to_string(),
        };

        let mut plain = RgbImage::new(100, 100);
        draw_detections(&mut plain, &[d.clone()], None, 20., 2.);
        assert_eq!(*plain.get_pixel(1, 0), Rgb([0, 0, 0]));

        // y1 < font_size なのでラベルは上端、x1 < 0 なので左端に寄る
        let mut labeled = RgbImage::new(100, 100);
        draw_detections(&mut labeled, &[d], Some(&font), 20., 2.);
        assert_eq!(*labeled.get_pixel(1, 0), color);
        assert_eq!(*labeled.get_pixel(1, 19), color);
        assert_eq!(*labeled.get_pixel(1, 21), Rgb([0, 0, 0]));

        // 背景が暗いので文字は白寄りになる
        let text_pixels = labeled
            .enumerate_pixels()
            .filter(|(_, y, p)| *y < 20 && p[1] > 100)
            .count();
        assert!(text_pixels > 0);
    }

    #[test]
    fn invalid_font_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.ttf");
        fs::write(&path, b"not a font").unwrap();
        assert!(load_font(&path).is_err());
        assert!(load_font(dir.path().join("missing.ttf")).is_err());
    }

    #[test]
    fn class_color_wraps_around() {
        assert_eq!(class_color(0), class_color(10));
    }

    #[test]
    fn missing_image_is_load_failure() {
        let err = read_image("/nonexistent/none.jpg").unwrap_err();
        assert!(matches!(err, Error::ImageLoadFailure { .. }));
    }
}
