use crate::domain::entities::{ContentItem, ContentVariation, OfflineQueueEntry, PublishReceipt};
use crate::domain::value_objects::{ContentId, ContentStatus, SyncStatus};
use chrono::{DateTime, Utc};
use lru::LruCache;
use std::collections::HashSet;
use std::fmt;
use std::num::NonZeroUsize;
use tracing::debug;

pub const DEFAULT_MAX_CONTENT_ITEMS: usize = 500;

/// コンテンツスライスへの変更
#[derive(Debug, Clone)]
pub enum ContentAction {
    /// 新規なら末尾に追加、既存なら挿入順を保ったまま置き換える
    Upsert(ContentItem),
    Generated {
        id: ContentId,
        variations: Vec<ContentVariation>,
        at: DateTime<Utc>,
    },
    MarkPending(ContentId),
    MarkSynced(ContentId),
    /// リモートに恒久的に拒否された
    MarkFailed(ContentId),
    ApplyReceipt {
        receipt: PublishReceipt,
        at: DateTime<Utc>,
    },
    Duplicate {
        source: ContentId,
        new_id: ContentId,
        at: DateTime<Utc>,
    },
    Remove(ContentId),
}

impl ContentAction {
    /// リモート呼び出しが片付いた後の同期状態。キューに残りがあれば `Pending` のまま
    pub fn settle(id: ContentId, still_queued: bool) -> Self {
        if still_queued {
            ContentAction::MarkPending(id)
        } else {
            ContentAction::MarkSynced(id)
        }
    }

    /// 恒久的に拒否された後の同期状態。同じ項目の別エントリが残っていれば再送を待つ
    pub fn settle_rejected(id: ContentId, still_queued: bool) -> Self {
        if still_queued {
            ContentAction::MarkPending(id)
        } else {
            ContentAction::MarkFailed(id)
        }
    }
}

/// 生成済みコンテンツのメモリ上のキャッシュ。
/// 上限を超えると最も古く挿入された項目から捨てる。
pub struct ContentState {
    items: LruCache<ContentId, ContentItem>,
}

impl ContentState {
    pub fn new(max_items: usize) -> Self {
        let capacity = NonZeroUsize::new(max_items)
            .or(NonZeroUsize::new(DEFAULT_MAX_CONTENT_ITEMS))
            .unwrap_or(NonZeroUsize::MIN);
        Self {
            items: LruCache::new(capacity),
        }
    }

    /// 永続化済みのスナップショット（古い順）から復元する
    pub fn restore(max_items: usize, snapshot: Vec<ContentItem>) -> Self {
        let mut state = Self::new(max_items);
        for item in snapshot {
            state.apply(ContentAction::Upsert(item));
        }
        state
    }

    pub fn reduce(mut self, action: ContentAction) -> Self {
        self.apply(action);
        self
    }

    pub fn apply(&mut self, action: ContentAction) {
        match action {
            ContentAction::Upsert(item) => self.upsert(item),
            ContentAction::Generated { id, variations, at } => {
                self.update(&id, |item| {
                    item.variations = variations;
                    if item.status == ContentStatus::Failed {
                        item.status = ContentStatus::Draft;
                    }
                    item.sync_status = SyncStatus::Synced;
                    item.updated_at = at;
                });
            }
            ContentAction::MarkPending(id) => {
                self.update(&id, |item| item.sync_status = SyncStatus::Pending);
            }
            ContentAction::MarkSynced(id) => {
                self.update(&id, |item| item.sync_status = SyncStatus::Synced);
            }
            ContentAction::MarkFailed(id) => {
                self.update(&id, |item| {
                    item.sync_status = SyncStatus::Failed;
                    item.status = ContentStatus::Failed;
                });
            }
            ContentAction::ApplyReceipt { receipt, at } => {
                let id = receipt.content_id.clone();
                self.update(&id, |item| {
                    item.apply_receipt(&receipt, at);
                    item.sync_status = SyncStatus::Synced;
                });
            }
            ContentAction::Duplicate { source, new_id, at } => {
                if let Some(copy) = self.items.peek(&source).map(|item| item.duplicate(new_id, at)) {
                    self.upsert(copy);
                }
            }
            ContentAction::Remove(id) => {
                self.items.pop(&id);
            }
        }
    }

    fn upsert(&mut self, item: ContentItem) {
        if let Some(existing) = self.items.peek_mut(&item.id) {
            *existing = item;
            return;
        }
        if let Some((evicted_id, _)) = self.items.push(item.id.clone(), item) {
            debug!("Content cache full, evicted {evicted_id}");
        }
    }

    fn update(&mut self, id: &ContentId, change: impl FnOnce(&mut ContentItem)) {
        match self.items.peek_mut(id) {
            Some(item) => change(item),
            None => debug!("Ignoring update for unknown content {id}"),
        }
    }

    /// キューの参照状況から `Pending` を付け直す。
    /// 参照されているのに `Pending` でない項目は `Pending` に、
    /// 参照が失われた `Pending` 項目は `Failed` にする。変更件数を返す。
    pub fn reconcile_sync_status(&mut self, queue: &[OfflineQueueEntry]) -> usize {
        let referenced: HashSet<&ContentId> = queue
            .iter()
            .filter_map(|entry| entry.mutation.target_content_id())
            .collect();

        let mut changed = 0;
        for (id, item) in self.items.iter_mut() {
            let expected = if referenced.contains(id) {
                SyncStatus::Pending
            } else if item.sync_status == SyncStatus::Pending {
                SyncStatus::Failed
            } else {
                continue;
            };
            if item.sync_status != expected {
                item.sync_status = expected;
                changed += 1;
            }
        }
        changed
    }

    pub fn get(&self, id: &ContentId) -> Option<&ContentItem> {
        self.items.peek(id)
    }

    pub fn contains(&self, id: &ContentId) -> bool {
        self.items.contains(id)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.items.cap().get()
    }

    /// 古い順
    pub fn iter(&self) -> impl Iterator<Item = &ContentItem> {
        self.items.iter().rev().map(|(_, item)| item)
    }

    pub fn pending_ids(&self) -> Vec<ContentId> {
        self.iter()
            .filter(|item| item.sync_status == SyncStatus::Pending)
            .map(|item| item.id.clone())
            .collect()
    }

    /// 永続化用。古い順に並ぶので `restore` で挿入順が再現される
    pub fn snapshot(&self) -> Vec<ContentItem> {
        self.iter().cloned().collect()
    }
}

impl Default for ContentState {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_CONTENT_ITEMS)
    }
}

impl fmt::Debug for ContentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContentState")
            .field("len", &self.items.len())
            .field("capacity", &self.capacity())
            .finish()
    }
}
