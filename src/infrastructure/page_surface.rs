//! 基于 chromiumoxide 页面的 Surface 实现
//!
//! 每个操作对应一段注入的 JS。元素句柄保存在 `data-jaa-ref` 属性里，
//! 第一次被快照采集时分配，之后保持不变

use anyhow::Result;
use async_trait::async_trait;
use serde_json::json;
use tracing::debug;

use super::js_executor::JsExecutor;
use super::surface::Surface;
use crate::models::{ButtonSnapshot, ListingSnapshot, ModalSnapshot};

/// 分配 / 查找句柄的公共片段
const REF_HELPERS: &str = r#"
    const ref = (el) => {
        if (!el.dataset.jaaRef) {
            window.__jaaSeq = (window.__jaaSeq || 0) + 1;
            el.dataset.jaaRef = 'r' + window.__jaaSeq;
        }
        return el.dataset.jaaRef;
    };
    const byRef = (handle) => document.querySelector(`[data-jaa-ref="${handle}"]`);
    const textOf = (el) => (el && el.textContent != null ? el.textContent.trim() : null);
"#;

const LISTING_JS: &str = r#"
    const items = Array.from(
        document.querySelectorAll('.job-card-container, .jobs-search-results__list-item')
    ).map(card => ({
        handle: ref(card),
        processed: card.hasAttribute('data-auto-apply-processed'),
        hasLink: card.querySelector('.job-card-container__link, .job-card-list__title') !== null,
    }));
    const toNumber = (el) => {
        const n = parseInt(textOf(el), 10);
        return Number.isNaN(n) ? null : n;
    };
    const active = document.querySelector('button[aria-current="true"]');
    const pageButtons = Array.from(document.querySelectorAll('button[aria-label*="Page"]'))
        .map(btn => ({ handle: ref(btn), number: toNumber(btn) }));
    return { items, currentPage: active ? toNumber(active) : null, pageButtons };
"#;

const ENTRY_POINT_JS: &str = r#"
    const btn = document.querySelector('.jobs-apply-button:not([data-auto-apply-processed])');
    if (!btn) return null;
    return {
        handle: ref(btn),
        text: btn.textContent.trim().toLowerCase(),
        ariaLabel: (btn.getAttribute('aria-label') || '').toLowerCase(),
        classes: Array.from(btn.classList),
        disabled: !!btn.disabled,
    };
"#;

const MODAL_JS: &str = r#"
    const modal = document.querySelector('.jobs-easy-apply-modal');
    if (!modal) return null;

    const forLabel = (field) => {
        if (!field.id) return null;
        return textOf(document.querySelector(`label[for="${CSS.escape(field.id)}"]`));
    };
    const ancestorLabel = (field) => {
        for (let el = field.parentElement; el; el = el.parentElement) {
            const label = el.querySelector('label');
            if (label) return textOf(label);
        }
        return null;
    };
    const kindOf = (field) => {
        if (field.tagName === 'SELECT') return 'select';
        if (field.tagName === 'TEXTAREA') return 'textarea';
        const type = (field.type || '').toLowerCase();
        return ['radio', 'checkbox', 'file'].includes(type) ? type : 'text';
    };

    const sections = Array.from(modal.querySelectorAll('section'));
    const fields = Array.from(
        modal.querySelectorAll('input:not([type="hidden"]), textarea, select')
    ).map(field => {
        const group = field.closest('fieldset, div');
        const container = field.closest('div, section, form');
        const isSelect = field.tagName === 'SELECT';
        return {
            handle: ref(field),
            kind: kindOf(field),
            id: field.id || '',
            name: field.name || '',
            value: field.value || '',
            checked: !!field.checked,
            disabled: !!field.disabled,
            hidden: field.style.display === 'none',
            options: isSelect
                ? Array.from(field.options).map(o => ({ value: o.value, text: o.text }))
                : [],
            selectedIndex: isSelect ? field.selectedIndex : -1,
            forLabel: forLabel(field),
            ancestorLabel: ancestorLabel(field),
            groupLegend: group ? textOf(group.querySelector('legend')) : null,
            groupLabel: group ? textOf(group.querySelector('label')) : null,
            containerText: container ? container.textContent.toLowerCase() : '',
            accept: (field.accept || '').toLowerCase(),
            ariaLabel: (field.getAttribute('aria-label') || '').toLowerCase(),
        };
    });

    const buttons = Array.from(modal.querySelectorAll('button')).map(btn => {
        const span = btn.querySelector('span');
        const section = sections.indexOf(btn.closest('section'));
        return {
            handle: ref(btn),
            text: btn.textContent.trim().toLowerCase(),
            spanText: span ? span.textContent.trim().toLowerCase() : '',
            ariaLabel: (btn.getAttribute('aria-label') || '').toLowerCase(),
            classes: Array.from(btn.classList),
            inFooter: btn.closest('footer') !== null,
            disabled: !!btn.disabled,
            section: section >= 0 ? section : null,
        };
    });

    return {
        text: modal.textContent,
        fields,
        buttons,
        sections: sections.map(s => ({ text: s.textContent })),
        hasResumePicker: modal.querySelector('.jobs-resume-picker') !== null,
        jobTitle: textOf(document.querySelector('.jobs-unified-top-card__job-title')),
        jobLocation: textOf(document.querySelector('.jobs-unified-top-card__bullet')),
    };
"#;

const MODAL_VISIBLE_JS: &str = r#"
    const modal = document.querySelector('.jobs-easy-apply-modal');
    return !!(modal && modal.offsetParent);
"#;

const MARK_PROCESSED_JS: &str = r#"
    const el = byRef(args.handle);
    if (el) el.setAttribute('data-auto-apply-processed', 'true');
    return el !== null;
"#;

const SCROLL_JS: &str = r#"
    const el = byRef(args.handle);
    if (el) el.scrollIntoView({ behavior: 'smooth', block: 'center' });
    return el !== null;
"#;

const CLICK_ITEM_LINK_JS: &str = r#"
    const card = byRef(args.handle);
    const link = card && card.querySelector('.job-card-container__link, .job-card-list__title');
    if (!link) return false;
    link.click();
    return true;
"#;

const CLICK_JS: &str = r#"
    const el = byRef(args.handle);
    if (!el) return false;
    el.click();
    return true;
"#;

// React 受控组件需要走原型上的 setter 才能感知到新值
const SET_VALUE_JS: &str = r#"
    const el = byRef(args.handle);
    if (!el) return false;
    const proto = el.tagName === 'SELECT' ? HTMLSelectElement.prototype
        : el.tagName === 'TEXTAREA' ? HTMLTextAreaElement.prototype
        : HTMLInputElement.prototype;
    const setter = Object.getOwnPropertyDescriptor(proto, 'value').set;
    setter.call(el, args.value);
    el.dispatchEvent(new Event('input', { bubbles: true }));
    el.dispatchEvent(new Event('change', { bubbles: true }));
    return true;
"#;

const CHECK_RADIO_JS: &str = r#"
    const el = byRef(args.handle);
    if (!el) return false;
    el.checked = true;
    el.dispatchEvent(new Event('input', { bubbles: true }));
    el.dispatchEvent(new Event('change', { bubbles: true }));
    return true;
"#;

const ESCAPE_JS: &str = r#"
    document.dispatchEvent(new KeyboardEvent('keydown', {
        key: 'Escape', code: 'Escape', keyCode: 27, which: 27, bubbles: true,
    }));
    return true;
"#;

/// 真实浏览器页面
pub struct PageSurface {
    executor: JsExecutor,
}

impl PageSurface {
    pub fn new(executor: JsExecutor) -> Self {
        Self { executor }
    }

    fn wrap(body: &str) -> String {
        format!("(args) => {{ {} {} }}", REF_HELPERS, body)
    }

    async fn run<T: serde::de::DeserializeOwned>(
        &self,
        body: &str,
        args: serde_json::Value,
    ) -> Result<T> {
        self.executor.call_as(&Self::wrap(body), &args).await
    }
}

#[async_trait]
impl Surface for PageSurface {
    async fn current_url(&self) -> Result<String> {
        self.executor.url().await
    }

    async fn listing(&self) -> Result<ListingSnapshot> {
        let listing: ListingSnapshot = self.run(LISTING_JS, json!({})).await?;
        debug!(
            "列表快照: {} 张卡片, 当前页 {:?}",
            listing.items.len(),
            listing.current_page
        );
        Ok(listing)
    }

    async fn mark_processed(&self, handle: &str) -> Result<()> {
        let _: bool = self.run(MARK_PROCESSED_JS, json!({ "handle": handle })).await?;
        Ok(())
    }

    async fn scroll_into_view(&self, handle: &str) -> Result<()> {
        let _: bool = self.run(SCROLL_JS, json!({ "handle": handle })).await?;
        Ok(())
    }

    async fn click_item_link(&self, handle: &str) -> Result<bool> {
        self.run(CLICK_ITEM_LINK_JS, json!({ "handle": handle })).await
    }

    async fn entry_point(&self) -> Result<Option<ButtonSnapshot>> {
        self.run(ENTRY_POINT_JS, json!({})).await
    }

    async fn modal(&self) -> Result<Option<ModalSnapshot>> {
        self.run(MODAL_JS, json!({})).await
    }

    async fn modal_visible(&self) -> Result<bool> {
        self.run(MODAL_VISIBLE_JS, json!({})).await
    }

    async fn click(&self, handle: &str) -> Result<bool> {
        self.run(CLICK_JS, json!({ "handle": handle })).await
    }

    async fn set_field_value(&self, handle: &str, value: &str) -> Result<bool> {
        self.run(SET_VALUE_JS, json!({ "handle": handle, "value": value }))
            .await
    }

    async fn check_radio(&self, handle: &str) -> Result<bool> {
        self.run(CHECK_RADIO_JS, json!({ "handle": handle })).await
    }

    async fn press_escape(&self) -> Result<()> {
        let _: bool = self.run(ESCAPE_JS, json!({})).await?;
        Ok(())
    }
}
