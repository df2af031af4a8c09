//! 搜索窗口上的加权图与 Dijkstra 搜索.

use super::cost::{CostClass, CostTable};
use super::window::SearchWindow;
use crate::consts::label::{is_background, is_surface};
use crate::Idx3d;
use binary_heap_plus::BinaryHeap;
use ndarray::{Array3, ArrayView3};

/// 图节点. 原始标签与重新分配的代价等级分开保存.
#[derive(Copy, Clone, Debug, Default)]
struct Node {
    /// mask 值是否为 1.
    is_surface: bool,

    /// 表面体素的代价等级. 非表面体素为 `None`.
    class: Option<CostClass>,
}

/// 搜索窗口内的加权图.
///
/// 节点是窗口内的每个体素, 边是窗口内任意两个 26-邻接 (单层窗口为 8-邻接) 的体素对.
/// 边不显式保存: `u -> v` 的权重在搜索时由两端节点按如下规则求出:
///
/// - `u`, `v` 均为表面体素时, 权重为 `v` 的代价等级对应的权重;
/// - 其他情况下权重为 `+inf`, 即不可通过.
pub(crate) struct WeightedGraph<'t> {
    window: SearchWindow,
    nodes: Array3<Node>,
    table: &'t CostTable,
}

impl<'t> WeightedGraph<'t> {
    /// 在 `mask` 的 `window` 区域上建图, 并按 `table` 为表面体素分配代价等级.
    pub fn build(mask: ArrayView3<u8>, window: SearchWindow, table: &'t CostTable) -> Self {
        let mut nodes = Array3::<Node>::default(window.shape());
        let at = |local: Idx3d| mask[window.to_global(local)];

        for (local, node) in nodes.indexed_iter_mut() {
            if !is_surface(at(local)) {
                continue;
            }
            let zero_count = window
                .neighbours(local)
                .filter(|n| is_background(at(*n)))
                .count() as u32;
            *node = Node {
                is_surface: true,
                class: Some(table.classify(zero_count)),
            };
        }

        Self {
            window,
            nodes,
            table,
        }
    }

    /// 图所在的窗口.
    #[inline]
    pub fn window(&self) -> &SearchWindow {
        &self.window
    }

    /// 表面节点个数.
    pub fn surface_len(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_surface).count()
    }

    /// 边 `from -> to` 的权重 (局部坐标). 不可通过时为 `+inf`.
    #[inline]
    pub fn weight(&self, from: Idx3d, to: Idx3d) -> f64 {
        match (self.nodes[from], self.nodes[to]) {
            (
                Node {
                    is_surface: true, ..
                },
                Node {
                    is_surface: true,
                    class: Some(class),
                },
            ) => self.table.weight(class),
            _ => f64::INFINITY,
        }
    }

    /// 局部坐标 -> 节点线性编号.
    #[inline]
    fn id(&self, (i, j, k): Idx3d) -> usize {
        let (_, b, c) = self.window.shape();
        (i * b + j) * c + k
    }

    /// 节点线性编号 -> 局部坐标.
    #[inline]
    fn pos(&self, id: usize) -> Idx3d {
        let (_, b, c) = self.window.shape();
        (id / (b * c), (id / c) % b, id % c)
    }

    /// 从 `start` 到 `end` (全局坐标) 的最小代价路径, 含两端点.
    ///
    /// 端点不在窗口内, 或不存在有限代价路径时返回 `None`.
    pub fn shortest_path(&self, start: Idx3d, end: Idx3d) -> Option<(Vec<Idx3d>, f64)> {
        if !self.window.contains(start) || !self.window.contains(end) {
            return None;
        }
        let (src, dst) = (self.window.to_local(start), self.window.to_local(end));
        let (src_id, dst_id) = (self.id(src), self.id(dst));
        let n = self.window.len();

        let mut dist = vec![f64::INFINITY; n];
        let mut prev = vec![usize::MAX; n];
        let mut done = vec![false; n];

        // 堆顶代价最小; 代价相同时编号小者优先, 保证结果确定.
        let mut heap: BinaryHeap<(f64, usize), _> =
            BinaryHeap::new_by(|a: &(f64, usize), b: &(f64, usize)| {
                b.0.total_cmp(&a.0).then_with(|| b.1.cmp(&a.1))
            });
        heap.reserve(64);

        dist[src_id] = 0.0;
        heap.push((0.0, src_id));

        while let Some((d, id)) = heap.pop() {
            if done[id] {
                continue;
            }
            done[id] = true;
            if id == dst_id {
                break;
            }
            let cur = self.pos(id);
            for neigh in self.window.neighbours(cur) {
                let w = self.weight(cur, neigh);
                if !w.is_finite() {
                    continue;
                }
                let nid = self.id(neigh);
                let nd = d + w;
                if !done[nid] && nd < dist[nid] {
                    dist[nid] = nd;
                    prev[nid] = id;
                    heap.push((nd, nid));
                }
            }
        }

        if !dist[dst_id].is_finite() {
            return None;
        }

        let mut path = vec![end];
        let mut id = dst_id;
        while id != src_id {
            id = prev[id];
            path.push(self.window.to_global(self.pos(id)));
        }
        path.reverse();
        Some((path, dist[dst_id]))
    }
}

#[cfg(test)]
mod tests {
    use super::WeightedGraph;
    use crate::geodesic::cost::{CostClass, CostTable};
    use crate::geodesic::window::SearchWindow;
    use ndarray::Array3;

    /// 一块实心 mask: 内部体素没有背景邻居, 边缘体素有.
    fn slab() -> Array3<u8> {
        let mut m = Array3::<u8>::zeros((12, 12, 12));
        m.slice_mut(ndarray::s![2..10, 2..10, 2..10]).fill(1);
        m
    }

    #[test]
    fn test_classes() {
        let m = slab();
        let t = CostTable::default_3d();
        let w = SearchWindow::around((1, 1, 1), (10, 10, 10), (12, 12, 12), 0.0, false);
        // 距离非 0 时 ratio 为 0 会得到 0 边距, 因此窗口恰好覆盖两点.
        let w = w.unwrap();
        let g = WeightedGraph::build(m.view(), w, &t);
        assert_eq!(g.surface_len(), 8 * 8 * 8);

        let local = |p| g.window().to_local(p);
        // 角体素: 26 个邻居中 19 个背景.
        assert_eq!(g.weight(local((3, 3, 3)), local((2, 2, 2))), t.weight(CostClass::C3));
        // 内部体素没有背景邻居.
        assert_eq!(g.weight(local((4, 4, 4)), local((5, 5, 5))), t.weight(CostClass::C6));
        // 进入背景不可通过.
        assert!(g.weight(local((2, 2, 2)), local((1, 1, 1))).is_infinite());
    }

    #[test]
    fn test_shortest_path_straight() {
        let mut m = Array3::<u8>::zeros((10, 10, 10));
        for i in 2..8 {
            m[[i, 5, 5]] = 1;
        }
        let t = CostTable::default_3d();
        let w = SearchWindow::around((2, 5, 5), (7, 5, 5), (10, 10, 10), 0.1, false).unwrap();
        let g = WeightedGraph::build(m.view(), w, &t);
        let (path, cost) = g.shortest_path((2, 5, 5), (7, 5, 5)).unwrap();
        assert_eq!(path, (2..8).map(|i| (i, 5, 5)).collect::<Vec<_>>());
        // 线上的每个体素都有 >= 5 个背景邻居.
        assert_eq!(cost, 5.0 * t.weight(CostClass::C3));
    }

    #[test]
    fn test_no_path() {
        let mut m = Array3::<u8>::zeros((10, 10, 10));
        m[[2, 5, 5]] = 1;
        m[[7, 5, 5]] = 1;
        let t = CostTable::default_3d();
        let w = SearchWindow::around((2, 5, 5), (7, 5, 5), (10, 10, 10), 0.1, false).unwrap();
        let g = WeightedGraph::build(m.view(), w, &t);
        assert!(g.shortest_path((2, 5, 5), (7, 5, 5)).is_none());
    }
}
