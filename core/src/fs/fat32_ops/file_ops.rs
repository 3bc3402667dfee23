// FAT32 cluster chains and file data

use super::types::{BAD_CLUSTER, END_OF_CHAIN, END_OF_CHAIN_MIN};
use super::Fat32Volume;
use crate::fs::fat32_format::format::{read_sectors, write_sectors};
use crate::fs::{FsError, FsResult};
use gpt_disk_io::BlockIo;

/// Consecutive cluster runs as (first cluster, cluster count)
fn runs(chain: &[u32]) -> Vec<(u32, usize)> {
    let mut out: Vec<(u32, usize)> = Vec::new();
    for &cluster in chain {
        match out.last_mut() {
            Some((start, len)) if *start + *len as u32 == cluster => *len += 1,
            _ => out.push((cluster, 1)),
        }
    }
    out
}

impl<B: BlockIo> Fat32Volume<B> {
    /// Clusters of the chain starting at `first`; cluster 0 is an empty chain
    pub(super) fn chain(&self, first: u32) -> FsResult<Vec<u32>> {
        let mut chain = Vec::new();
        let mut cluster = first;
        if cluster == 0 {
            return Ok(chain);
        }
        loop {
            if cluster < 2 || cluster >= self.ctx.cluster_limit {
                return Err(FsError::Corrupt("cluster chain leaves the volume"));
            }
            if chain.len() >= self.ctx.cluster_limit as usize {
                return Err(FsError::Corrupt("cluster chain loops"));
            }
            chain.push(cluster);
            let next = self.fat[cluster as usize];
            if next >= END_OF_CHAIN_MIN {
                return Ok(chain);
            }
            if next == 0 || next == BAD_CLUSTER {
                return Err(FsError::Corrupt("cluster chain hits a free or bad cluster"));
            }
            cluster = next;
        }
    }

    /// Allocate and link `count` clusters
    pub(super) fn allocate(&mut self, count: usize) -> FsResult<Vec<u32>> {
        if count > self.free as usize {
            let cluster_bytes = self.ctx.cluster_bytes() as u64;
            return Err(FsError::NoSpace {
                needed: count as u64 * cluster_bytes,
                available: self.free as u64 * cluster_bytes,
            });
        }

        let limit = self.ctx.cluster_limit;
        let mut chain = Vec::with_capacity(count);
        let mut cluster = self.next_free.clamp(2, limit - 1);
        while chain.len() < count {
            if self.fat[cluster as usize] == 0 {
                chain.push(cluster);
            }
            cluster = if cluster + 1 >= limit { 2 } else { cluster + 1 };
        }

        for pair in chain.windows(2) {
            self.fat[pair[0] as usize] = pair[1];
        }
        if let Some(&last) = chain.last() {
            self.fat[last as usize] = END_OF_CHAIN;
            self.next_free = if last + 1 >= limit { 2 } else { last + 1 };
        }
        self.free -= count as u32;
        Ok(chain)
    }

    /// Return every cluster of the chain at `first` to the free pool
    pub(super) fn release(&mut self, first: u32) -> FsResult<()> {
        let chain = self.chain(first)?;
        for &cluster in &chain {
            self.fat[cluster as usize] = 0;
        }
        self.free += chain.len() as u32;
        if let Some(&lowest) = chain.iter().min() {
            self.next_free = self.next_free.min(lowest);
        }
        Ok(())
    }

    /// Append one zeroed cluster to `chain`
    pub(super) fn extend_chain(&mut self, chain: &mut Vec<u32>) -> FsResult<u32> {
        let cluster = self.allocate(1)?[0];
        if let Some(&last) = chain.last() {
            self.fat[last as usize] = cluster;
        }
        chain.push(cluster);
        self.write_chain(&[cluster], &[])?;
        Ok(cluster)
    }

    pub(super) fn read_chain(&mut self, chain: &[u32], len: usize) -> FsResult<Vec<u8>> {
        let cluster_bytes = self.ctx.cluster_bytes();
        let mut data = vec![0u8; chain.len() * cluster_bytes];
        let mut offset = 0;
        for (start, count) in runs(chain) {
            let bytes = count * cluster_bytes;
            read_sectors(
                &mut self.block_io,
                self.ctx.cluster_to_sector(start),
                &mut data[offset..offset + bytes],
            )?;
            offset += bytes;
        }
        data.truncate(len);
        Ok(data)
    }

    /// Write `data` over `chain`, zero filling the tail of the last cluster
    pub(super) fn write_chain(&mut self, chain: &[u32], data: &[u8]) -> FsResult<()> {
        let cluster_bytes = self.ctx.cluster_bytes();
        let mut offset = 0;
        for (start, count) in runs(chain) {
            let bytes = count * cluster_bytes;
            let mut buf = vec![0u8; bytes];
            let end = (offset + bytes).min(data.len());
            if offset < end {
                buf[..end - offset].copy_from_slice(&data[offset..end]);
            }
            write_sectors(
                &mut self.block_io,
                self.ctx.cluster_to_sector(start),
                &buf,
            )?;
            offset += bytes;
        }
        Ok(())
    }
}
