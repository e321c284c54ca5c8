//! 物体検出の結果を保持するモジュール

use crate::bbox::AbsoluteBox;
use crate::error::Error;

/// 検出器から受け取った1つの検出結果
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    /// クラス
    pub class_id: u32,
    /// バウンディングボックス (画素座標)
    pub bbox: AbsoluteBox,
    /// クラス名
    pub class_name: String,
}

impl Detection {
    /// 検出器の出力した (x1, y1, x2, y2) から新しいDetectionを作成します。
    ///
    /// # Args
    ///
    /// * `class_id` - クラスID
    /// * `xyxy` - バウンディングボックスの左上と右下の座標 (画素単位の実数)
    /// * `class_names` - クラスIDに対応するクラス名の一覧
    ///
    /// # Return
    /// * 新たなDetectionインスタンス。座標は0方向に切り捨てます
    /// * クラス名の一覧に無いIDの場合は `Error::UnknownClass`
    pub fn from_xyxy(class_id: u32, xyxy: [f32; 4], class_names: &[String]) -> Result<Self, Error> {
        let class_name = class_names
            .get(class_id as usize)
            .ok_or_else(|| Error::UnknownClass(class_id.to_string()))?
            .clone();

        let [x1, y1, x2, y2] = xyxy;
        Ok(Self {
            class_id,
            bbox: AbsoluteBox::new(x1 as i32, y1 as i32, x2 as i32, y2 as i32),
            class_name,
        })
    }
}
