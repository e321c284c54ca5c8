//! アノテーションをコンテナ / 被包含 / 無視 に分類するモジュール

use std::collections::BTreeSet;

use serde::Deserialize;

use crate::bbox::NormalizedBox;

/// ボックスの役割
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// 外側の物体 (人など)
    Container,
    /// コンテナに属しうる物体
    Containee,
    /// 処理から除外する物体
    Ignored,
}

/// クラスIDと役割の対応
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ClassRoles {
    /// コンテナとして扱うクラスID
    pub container_class: u32,
    /// 除外するクラスID
    pub ignored_classes: BTreeSet<u32>,
}

impl Default for ClassRoles {
    /// person = 0、mask (3) と vest (6) を除外
    fn default() -> Self {
        Self {
            container_class: 0,
            ignored_classes: BTreeSet::from([3, 6]),
        }
    }
}

impl ClassRoles {
    pub fn new<I: IntoIterator<Item = u32>>(container_class: u32, ignored_classes: I) -> Self {
        Self {
            container_class,
            ignored_classes: ignored_classes.into_iter().collect(),
        }
    }

    pub fn role_of(&self, class_id: u32) -> Role {
        if class_id == self.container_class {
            Role::Container
        } else if self.ignored_classes.contains(&class_id) {
            Role::Ignored
        } else {
            Role::Containee
        }
    }
}

/// 分類結果。各列は入力の順序を保持します。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Partition {
    pub containers: Vec<NormalizedBox>,
    pub containees: Vec<NormalizedBox>,
    pub ignored: Vec<NormalizedBox>,
}

/// ボックスの列をクラスIDで分類します。幾何的な判定は行いません。
///
/// # Args
/// * `annotations` - 1枚の画像に対するボックスの列
/// * `roles` - クラスIDと役割の対応
///
/// # Return
/// * 分類結果
pub fn classify(annotations: &[NormalizedBox], roles: &ClassRoles) -> Partition {
    let mut partition = Partition::default();
    for &b in annotations {
        match roles.role_of(b.class_id) {
            Role::Container => partition.containers.push(b),
            Role::Containee => partition.containees.push(b),
            Role::Ignored => partition.ignored.push(b),
        }
    }
    partition
}

#[cfg(test)]
mod tests {
    use super::*;

    fn boxes(classes: &[u32]) -> Vec<NormalizedBox> {
        classes
            .iter()
            .enumerate()
            .map(|(i, &c)| NormalizedBox::new(c, 0.1 * i as f64, 0.5, 0.1, 0.1))
            .collect()
    }

    #[test]
    fn default_roles_match_person_taxonomy() {
        let roles = ClassRoles::default();
        assert_eq!(roles.role_of(0), Role::Container);
        assert_eq!(roles.role_of(3), Role::Ignored);
        assert_eq!(roles.role_of(6), Role::Ignored);
        for c in [1, 2, 4, 5, 7, 8, 9] {
            assert_eq!(roles.role_of(c), Role::Containee);
        }
    }

    #[test]
    fn partition_is_complete_and_ordered() {
        let input = boxes(&[1, 0, 6, 2, 0, 3, 9]);
        let p = classify(&input, &ClassRoles::default());

        assert_eq!(
            p.containers.len() + p.containees.len() + p.ignored.len(),
            input.len()
        );
        assert_eq!(p.containers, vec![input[1], input[4]]);
        assert_eq!(p.containees, vec![input[0], input[3], input[6]]);
        assert_eq!(p.ignored, vec![input[2], input[5]]);
    }

    #[test]
    fn custom_taxonomy() {
        let roles = ClassRoles::new(5, []);
        let input = boxes(&[5, 0, 3]);
        let p = classify(&input, &roles);
        assert_eq!(p.containers, vec![input[0]]);
        assert_eq!(p.containees, vec![input[1], input[2]]);
        assert!(p.ignored.is_empty());
    }
}
