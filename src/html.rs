use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};

use crate::explorer::{NoticeKind, ViewSnapshot};
use crate::listing::Entry;

/// 侧边栏的静态分类，纯展示，不影响列表行为
const MENU: &[(&str, &str)] = &[
    ("fa-folder", "全部文件"),
    ("fa-clock", "最近"),
    ("fa-video", "视频"),
    ("fa-image", "图片"),
    ("fa-file-alt", "文档"),
    ("fa-headphones", "音频"),
    ("fa-magnet", "BT种子"),
    ("fa-share-alt", "我的分享"),
];

pub fn render_page(snapshot: &ViewSnapshot) -> String {
    let menu_items: String = MENU
        .iter()
        .enumerate()
        .map(|(i, (icon, label))| {
            format!(
                r#"<li class="{}"><i class="fas fa-fw {}"></i>{}</li>"#,
                if i == 0 { "active" } else { "" },
                icon,
                label
            )
        })
        .collect();

    let toasts: String = snapshot
        .notices
        .iter()
        .map(|n| {
            let class = match n.kind {
                NoticeKind::Success => "toast success",
                NoticeKind::Error => "toast error",
            };
            format!(
                r#"<div class="{}" data-id="{}">{}</div>"#,
                class,
                n.id,
                html_escape::encode_text(&n.text)
            )
        })
        .collect();

    let body = if snapshot.loading {
        r#"<div class="loading"><i class="fas fa-spinner fa-spin"></i> 加载中…</div>"#.to_string()
    } else {
        render_table(&snapshot.entries)
    };

    format!(
        r#"<!DOCTYPE html>
<html lang="zh-CN">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>夸克网盘 - 全部文件</title>
    <link rel="stylesheet" href="https://cdnjs.cloudflare.com/ajax/libs/font-awesome/5.15.4/css/all.min.css">
    <link rel="stylesheet" href="/assets/quark.css">
</head>
<body>
    <div class="layout">
        <aside class="sider">
            <div class="user-info">
                <i class="fas fa-user-circle user-icon"></i>
                <div class="user-name">夸克8148</div>
                <div class="storage-bar"><div class="storage-used"></div></div>
                <div class="storage-info">3.5G/10G</div>
            </div>
            <ul class="menu">{menu_items}</ul>
        </aside>
        <div class="main">
            <header class="header">
                <img src="/assets/logo.svg" alt="Quark" class="logo">
                <form class="search" action="/files" method="get">
                    <i class="fas fa-search"></i>
                    <input type="search" placeholder="搜索全部文件" disabled>
                </form>
            </header>
            <main class="content">
                <div class="toolbar">
                    <form action="/upload" method="post" enctype="multipart/form-data" class="upload-form">
                        <label class="btn primary">
                            <i class="fas fa-upload"></i> 上传文件
                            <input type="file" name="file" multiple onchange="this.form.submit()">
                        </label>
                    </form>
                    <form action="/folder" method="post" class="folder-form">
                        <input type="text" name="name" placeholder="文件夹名称" required>
                        <button type="submit" class="btn"><i class="fas fa-folder-plus"></i> 新建文件夹</button>
                    </form>
                </div>
                <nav class="breadcrumb">{breadcrumb}</nav>
                {body}
            </main>
        </div>
    </div>
    <div class="toasts">{toasts}</div>
</body>
</html>"#,
        menu_items = menu_items,
        breadcrumb = breadcrumbs(&snapshot.prefix),
        body = body,
        toasts = toasts,
    )
}

fn render_table(entries: &[Entry]) -> String {
    let rows: String = entries.iter().map(render_row).collect();
    format!(
        r#"<div class="file-table">
    <div class="table-title">全部文件 {}</div>
    <table>
        <thead><tr><th>文件名</th><th>大小</th><th>修改日期</th><th>操作</th></tr></thead>
        <tbody>{}</tbody>
    </table>
</div>"#,
        entries.len(),
        rows
    )
}

fn render_row(entry: &Entry) -> String {
    let name = html_escape::encode_text(entry.name());
    let key = utf8_percent_encode(entry.key(), NON_ALPHANUMERIC);

    // 目录点击进入，文件点击取临时链接
    let name_cell = if entry.is_folder() {
        format!(
            r#"<a class="entry" href="/files?prefix={key}"><i class="fas fa-fw fa-folder"></i>{name}</a>"#
        )
    } else {
        format!(
            r#"<a class="entry" href="/link?key={key}"><i class="fas fa-fw fa-file"></i>{name}</a>"#
        )
    };

    format!(
        r#"<tr>
    <td>{name_cell}</td>
    <td class="size">{size}</td>
    <td class="mtime">{mtime}</td>
    <td class="ops">
        <form action="/delete" method="post">
            <input type="hidden" name="key" value="{raw_key}">
            <button type="submit" class="btn danger" title="删除"><i class="fas fa-trash-alt"></i></button>
        </form>
    </td>
</tr>"#,
        name_cell = name_cell,
        size = entry.size_display(),
        mtime = entry.modified_display(),
        raw_key = html_escape::encode_double_quoted_attribute(entry.key()),
    )
}

/// 面包屑：根是"全部文件"，逐段累积前缀
fn breadcrumbs(prefix: &str) -> String {
    let mut crumbs = vec![(String::new(), "全部文件".to_string())];
    let mut current = String::new();

    for part in prefix.split('/').filter(|p| !p.is_empty()) {
        current.push_str(part);
        current.push('/');
        crumbs.push((current.clone(), part.to_string()));
    }

    let last = crumbs.len() - 1;
    crumbs
        .iter()
        .enumerate()
        .map(|(i, (link, label))| {
            let label = html_escape::encode_text(label);
            if i == last {
                format!("<span>{label}</span>")
            } else {
                format!(
                    r#"<a href="/files?prefix={}">{label}</a> / "#,
                    utf8_percent_encode(link, NON_ALPHANUMERIC)
                )
            }
        })
        .collect()
}
