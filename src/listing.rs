use time::format_description::FormatItem;
use time::macros::format_description;
use time::OffsetDateTime;

use crate::store::RawListing;

const MTIME_FMT: &[FormatItem<'static>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");

/// 列表条目。目录没有大小和修改时间，用变体区分而不是布尔标记，
/// 渲染和点击分发时按变体走不同分支。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Entry {
    Folder {
        key: String,
        name: String,
    },
    File {
        key: String,
        name: String,
        size: u64,
        last_modified: Option<OffsetDateTime>,
    },
}

impl Entry {
    pub fn key(&self) -> &str {
        match self {
            Entry::Folder { key, .. } | Entry::File { key, .. } => key,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Entry::Folder { name, .. } | Entry::File { name, .. } => name,
        }
    }

    pub fn is_folder(&self) -> bool {
        matches!(self, Entry::Folder { .. })
    }

    /// 文件大小按 KB 保留两位小数展示，目录显示 "-"
    pub fn size_display(&self) -> String {
        match self {
            Entry::Folder { .. } => "-".to_string(),
            Entry::File { size, .. } => format!("{:.2} KB", *size as f64 / 1024.0),
        }
    }

    pub fn modified_display(&self) -> String {
        match self {
            Entry::Folder { .. } => "-".to_string(),
            Entry::File { last_modified, .. } => last_modified
                .and_then(|t| t.format(&MTIME_FMT).ok())
                .unwrap_or_else(|| "-".to_string()),
        }
    }
}

/// 把一次 list 响应投影成目录 + 文件的展示序列。
///
/// 目录在前、文件在后，各自保持后端返回顺序；与请求前缀同名的
/// 对象是目录占位符，跳过。任意一半缺失按空处理，投影永不失败。
pub fn project(raw: &RawListing, current_prefix: &str) -> Vec<Entry> {
    let folders = raw.common_prefixes.iter().map(|prefix| Entry::Folder {
        key: prefix.clone(),
        name: folder_name(prefix),
    });

    let files = raw
        .contents
        .iter()
        .filter(|obj| obj.key != current_prefix)
        .map(|obj| Entry::File {
            key: obj.key.clone(),
            name: file_name(&obj.key),
            size: obj.size,
            last_modified: obj.last_modified,
        });

    folders.chain(files).collect()
}

/// 公共前缀的展示名：去掉末尾分隔符后的最后一段
fn folder_name(prefix: &str) -> String {
    prefix
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or("")
        .to_string()
}

/// 对象键的展示名：最后一个分隔符之后的部分
fn file_name(key: &str) -> String {
    key.rsplit('/').next().unwrap_or(key).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::ObjectItem;

    fn item(key: &str, size: u64, ts: Option<i64>) -> ObjectItem {
        ObjectItem {
            key: key.to_string(),
            size,
            last_modified: ts.and_then(|s| OffsetDateTime::from_unix_timestamp(s).ok()),
        }
    }

    #[test]
    fn empty_listing_projects_to_empty() {
        let entries = project(&RawListing::default(), "");
        assert!(entries.is_empty(), "空响应应投影为空序列");
    }

    #[test]
    fn directory_marker_is_filtered() {
        let raw = RawListing {
            common_prefixes: vec![],
            contents: vec![item("docs/", 0, None), item("docs/a.txt", 10, None)],
        };
        let entries = project(&raw, "docs/");
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].key(), "docs/a.txt");
    }

    #[test]
    fn folder_name_is_last_segment() {
        let raw = RawListing {
            common_prefixes: vec!["docs/".into(), "a/b/c/".into()],
            contents: vec![],
        };
        let entries = project(&raw, "");
        assert_eq!(entries[0].name(), "docs");
        assert_eq!(entries[1].name(), "c");
    }

    #[test]
    fn file_name_is_after_last_slash() {
        let raw = RawListing {
            common_prefixes: vec![],
            contents: vec![item("a/b/report.pdf", 1, None), item("top.txt", 1, None)],
        };
        let entries = project(&raw, "");
        assert_eq!(entries[0].name(), "report.pdf");
        assert_eq!(entries[1].name(), "top.txt");
    }

    #[test]
    fn folders_precede_files() {
        let raw = RawListing {
            common_prefixes: vec!["z/".into(), "a/".into()],
            contents: vec![item("1.txt", 1, None), item("0.txt", 1, None)],
        };
        let entries = project(&raw, "");
        // 目录在前、文件在后，组内保持后端顺序
        let kinds: Vec<bool> = entries.iter().map(Entry::is_folder).collect();
        assert_eq!(kinds, vec![true, true, false, false]);
        assert_eq!(entries[0].name(), "z");
        assert_eq!(entries[2].name(), "1.txt");
    }

    #[test]
    fn docs_scenario() {
        let raw = RawListing {
            common_prefixes: vec!["docs/".into()],
            contents: vec![item("docs/a.txt", 2048, Some(1_700_000_000))],
        };
        let entries = project(&raw, "docs/");
        assert_eq!(entries.len(), 2);

        assert_eq!(entries[0].key(), "docs/");
        assert_eq!(entries[0].name(), "docs");
        assert!(entries[0].is_folder());
        assert_eq!(entries[0].size_display(), "-");

        assert_eq!(entries[1].key(), "docs/a.txt");
        assert_eq!(entries[1].name(), "a.txt");
        assert!(!entries[1].is_folder());
        assert_eq!(entries[1].size_display(), "2.00 KB");
        assert_eq!(entries[1].modified_display(), "2023-11-14 22:13:20");
    }

    #[test]
    fn size_rounds_to_two_decimals() {
        let raw = RawListing {
            common_prefixes: vec![],
            contents: vec![item("x", 500, None), item("y", 1024 * 1024, None)],
        };
        let entries = project(&raw, "");
        assert_eq!(entries[0].size_display(), "0.49 KB");
        assert_eq!(entries[1].size_display(), "1024.00 KB");
    }

    #[test]
    fn missing_mtime_renders_dash() {
        let raw = RawListing {
            common_prefixes: vec![],
            contents: vec![item("x", 1, None)],
        };
        assert_eq!(project(&raw, "")[0].modified_display(), "-");
    }
}
