//! バウンディングボックスの座標系を変換するモジュール
//!
//! 正規化座標 (cx, cy, w, h) と画素座標 (x1, y1, x2, y2) の相互変換、
//! および基準となるボックスの座標系への再投影を扱います。
//! 画素座標への変換はすべて 0 方向への切り捨てで統一しています。

use crate::error::Error;

/// 画像サイズに対する割合で表したバウンディングボックス
///
/// 上流のデータによっては `[0, 1]` の範囲外の値を取ることがありますが、
/// ここでは拒否せずそのまま保持します。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalizedBox {
    /// クラスID
    pub class_id: u32,
    /// 中心のx
    pub cx: f64,
    /// 中心のy
    pub cy: f64,
    /// 幅
    pub w: f64,
    /// 高さ
    pub h: f64,
}

/// 画素座標で表したバウンディングボックス
///
/// `x1 <= x2`, `y1 <= y2` は元の `w`, `h` が負でない場合にのみ成り立ちます。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AbsoluteBox {
    /// 左上のx
    pub x1: i32,
    /// 左上のy
    pub y1: i32,
    /// 右下のx
    pub x2: i32,
    /// 右下のy
    pub y2: i32,
}

/// 基準ボックスに対する相対位置。各成分は `[0, 1]` にクランプ済みです。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RelativeBox {
    /// 基準ボックス左上からのxオフセット
    pub x: f64,
    /// 基準ボックス左上からのyオフセット
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl NormalizedBox {
    pub fn new(class_id: u32, cx: f64, cy: f64, w: f64, h: f64) -> Self {
        Self { class_id, cx, cy, w, h }
    }

    /// PascalVOC形式の画素座標から正規化ボックスを作成します。
    ///
    /// # Args
    /// * `class_id` - クラスID
    /// * `xmin`, `xmax`, `ymin`, `ymax` - ボックスの端の画素座標
    /// * `img_w`, `img_h` - 画像サイズ
    ///
    /// # Return
    /// * 中心と大きさを画像サイズで割った新たなNormalizedBox
    pub fn from_pascal_voc(
        class_id: u32,
        xmin: f64,
        xmax: f64,
        ymin: f64,
        ymax: f64,
        img_w: u32,
        img_h: u32,
    ) -> Result<Self, Error> {
        if img_w == 0 || img_h == 0 {
            return Err(Error::InvalidImageSize {
                width: img_w,
                height: img_h,
            });
        }
        let dw = 1. / img_w as f64;
        let dh = 1. / img_h as f64;

        Ok(Self {
            class_id,
            cx: (xmin + xmax) / 2. * dw,
            cy: (ymin + ymax) / 2. * dh,
            w: (xmax - xmin) * dw,
            h: (ymax - ymin) * dh,
        })
    }

    /// 画素座標のボックスに変換します。
    ///
    /// # Args
    /// * `scale_w` - 横方向のスケール (画像の幅、または固定の基準サイズ)
    /// * `scale_h` - 縦方向のスケール
    ///
    /// # Return
    /// * 各座標を0方向に切り捨てたAbsoluteBox
    pub fn to_absolute(&self, scale_w: f64, scale_h: f64) -> AbsoluteBox {
        let x_center = self.cx * scale_w;
        let y_center = self.cy * scale_h;
        let half_w = self.w * scale_w / 2.;
        let half_h = self.h * scale_h / 2.;

        AbsoluteBox {
            x1: (x_center - half_w) as i32,
            y1: (y_center - half_h) as i32,
            x2: (x_center + half_w) as i32,
            y2: (y_center + half_h) as i32,
        }
    }
}

impl AbsoluteBox {
    pub fn new(x1: i32, y1: i32, x2: i32, y2: i32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// 幅。座標が i32 の端に張り付いていても溢れないよう i64 で返します。
    pub fn width(&self) -> i64 {
        self.x2 as i64 - self.x1 as i64
    }

    pub fn height(&self) -> i64 {
        self.y2 as i64 - self.y1 as i64
    }

    /// 基準ボックスとして使えるか (幅と高さが正か) を確認します。
    pub fn ensure_non_degenerate(&self) -> Result<(), Error> {
        if self.width() <= 0 || self.height() <= 0 {
            return Err(Error::InvalidReferenceBox {
                x1: self.x1,
                y1: self.y1,
                x2: self.x2,
                y2: self.y2,
            });
        }
        Ok(())
    }

    /// 正規化ボックスに戻します。`to_absolute` の逆変換です。
    pub fn to_normalized(&self, class_id: u32, scale_w: f64, scale_h: f64) -> NormalizedBox {
        NormalizedBox {
            class_id,
            cx: (self.x1 as f64 + self.x2 as f64) / 2. / scale_w,
            cy: (self.y1 as f64 + self.y2 as f64) / 2. / scale_h,
            w: self.width() as f64 / scale_w,
            h: self.height() as f64 / scale_h,
        }
    }

    /// `reference` の座標系における相対位置を求めます。
    ///
    /// # Args
    /// * `reference` - 基準となるボックス
    ///
    /// # Return
    /// * 各成分を `[0, 1]` にクランプしたRelativeBox
    /// * `reference` の幅または高さが0以下の場合は `Error::InvalidReferenceBox`
    pub fn to_reference_frame(&self, reference: &AbsoluteBox) -> Result<RelativeBox, Error> {
        reference.ensure_non_degenerate()?;
        let ref_w = reference.width() as f64;
        let ref_h = reference.height() as f64;

        Ok(RelativeBox {
            x: clamp_unit((self.x1 as i64 - reference.x1 as i64) as f64 / ref_w),
            y: clamp_unit((self.y1 as i64 - reference.y1 as i64) as f64 / ref_h),
            w: clamp_unit(self.width() as f64 / ref_w),
            h: clamp_unit(self.height() as f64 / ref_h),
        })
    }
}

fn clamp_unit(v: f64) -> f64 {
    v.clamp(0., 1.)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn to_absolute_truncates_toward_zero() {
        let b = NormalizedBox::new(0, 0.5, 0.5, 0.4, 0.4);
        assert_eq!(b.to_absolute(640., 640.), AbsoluteBox::new(192, 192, 448, 448));

        // 負側も0方向へ
        let b = NormalizedBox::new(0, 0.0, 0.0, 0.01, 0.01);
        assert_eq!(b.to_absolute(100., 100.), AbsoluteBox::new(0, 0, 0, 0));
        let b = NormalizedBox::new(0, 0.0, 0.0, 0.1, 0.1);
        assert_eq!(b.to_absolute(100., 100.), AbsoluteBox::new(-5, -5, 5, 5));
    }

    #[test]
    fn absolute_round_trip_stays_within_one_pixel() {
        let scales = [(640., 640.), (1920., 1080.), (333., 517.)];
        let boxes = [
            NormalizedBox::new(1, 0.5, 0.5, 0.4, 0.4),
            NormalizedBox::new(2, 0.123, 0.987, 0.05, 0.02),
            NormalizedBox::new(3, 0.71, 0.29, 0.33, 0.51),
        ];
        for &(sw, sh) in &scales {
            for b in &boxes {
                let back = b.to_absolute(sw, sh).to_normalized(b.class_id, sw, sh);
                assert_eq!(back.class_id, b.class_id);
                assert!((back.cx - b.cx).abs() <= 1. / sw, "{:?} -> {:?}", b, back);
                assert!((back.cy - b.cy).abs() <= 1. / sh, "{:?} -> {:?}", b, back);
                assert!((back.w - b.w).abs() <= 1. / sw, "{:?} -> {:?}", b, back);
                assert!((back.h - b.h).abs() <= 1. / sh, "{:?} -> {:?}", b, back);
            }
        }
    }

    #[test]
    fn pascal_voc_uses_midpoint_as_center() {
        let b = NormalizedBox::from_pascal_voc(4, 100., 300., 50., 250., 400, 500).unwrap();
        assert_eq!(b.class_id, 4);
        assert!((b.cx - 0.5).abs() < 1e-12);
        assert!((b.cy - 0.3).abs() < 1e-12);
        assert!((b.w - 0.5).abs() < 1e-12);
        assert!((b.h - 0.4).abs() < 1e-12);
    }

    #[test]
    fn pascal_voc_rejects_zero_sized_image() {
        let err = NormalizedBox::from_pascal_voc(0, 0., 1., 0., 1., 0, 10).unwrap_err();
        assert!(matches!(err, Error::InvalidImageSize { width: 0, height: 10 }));
    }

    #[test]
    fn reference_frame_is_relative_to_top_left() {
        let reference = AbsoluteBox::new(192, 192, 448, 448);
        let b = AbsoluteBox::new(320, 320, 384, 384);
        let r = b.to_reference_frame(&reference).unwrap();
        assert_eq!(r, RelativeBox { x: 0.5, y: 0.5, w: 0.25, h: 0.25 });
    }

    #[test]
    fn reference_frame_clamps_to_unit_range() {
        let reference = AbsoluteBox::new(100, 100, 200, 200);
        let cases = [
            AbsoluteBox::new(0, 0, 400, 400),
            AbsoluteBox::new(50, 150, 120, 900),
            AbsoluteBox::new(190, 190, 500, 500),
            AbsoluteBox::new(-300, -300, -200, -200),
        ];
        for b in &cases {
            let r = b.to_reference_frame(&reference).unwrap();
            for v in [r.x, r.y, r.w, r.h] {
                assert!((0. ..=1.).contains(&v), "{:?} -> {:?}", b, r);
            }
        }
    }

    #[test]
    fn saturated_coordinates_do_not_overflow() {
        // 1e10 は i32 の範囲を超えるので両端に張り付く
        let huge = NormalizedBox::new(0, 0.5, 0.5, 1e10, 0.4).to_absolute(640., 640.);
        assert_eq!((huge.x1, huge.x2), (i32::MIN, i32::MAX));
        assert_eq!(huge.width(), u32::MAX as i64);
        assert!(huge.ensure_non_degenerate().is_ok());

        let small = AbsoluteBox::new(320, 320, 384, 384);
        let r = small.to_reference_frame(&huge).unwrap();
        assert!((0. ..=1.).contains(&r.x));
        assert!(r.w > 0. && r.w < 1e-6);

        let r = huge.to_reference_frame(&small).unwrap();
        assert_eq!((r.x, r.w), (0., 1.));

        let back = huge.to_normalized(0, 640., 640.);
        assert!(back.w.is_finite() && back.w > 0.);
    }

    #[test]
    fn degenerate_reference_is_rejected() {
        let b = AbsoluteBox::new(0, 0, 10, 10);
        for reference in [
            AbsoluteBox::new(5, 0, 5, 10),
            AbsoluteBox::new(0, 5, 10, 5),
            AbsoluteBox::new(10, 0, 5, 10),
        ] {
            let err = b.to_reference_frame(&reference).unwrap_err();
            assert!(matches!(err, Error::InvalidReferenceBox { .. }));
        }
    }
}
