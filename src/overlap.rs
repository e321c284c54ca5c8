use crate::bbox::AbsoluteBox;

/// 2つのボックスが重なっているかを判定します。
///
/// どちらかの軸で離れている場合のみ false になります。
/// 辺が接しているだけの場合 (`b.x2 == a.x1` など) も重なりとみなします。
pub fn overlaps(a: &AbsoluteBox, b: &AbsoluteBox) -> bool {
    !(b.x2 < a.x1 || b.x1 > a.x2 || b.y2 < a.y1 || b.y1 > a.y2)
}
